pub const DEFAULT_BACKUP_TO: &str = "$HOME/Dropbox/backedup";
pub const DEFAULT_CONFIG_FILENAME: &str = ".backedup.yaml";
pub const DEFAULT_CONFIG_PATH: &str = "$HOME/.backedup.yaml";

/// Written on first run when the user asks for a fresh config.
pub const DEFAULT_CONFIG: &str = r#"
backup_to: $HOME/Dropbox/backedup
paths:
  - $HOME/.ackrc
  - $HOME/.aws
  - $HOME/.backedup.yaml
  - $HOME/.bash_history
  - $HOME/.bash_profile
  - $HOME/.bashrc
  - $HOME/.curlrc
  - $HOME/.dlv
  - $HOME/.dockercfg
  - $HOME/.docker
  - $HOME/.gitignore
  - $HOME/.gitconfig
  - $HOME/.oh-my-zsh
  - $HOME/.m2/settings.xml
  - $HOME/.m2/toolchains.xml
  - $HOME/.netrc
  - $HOME/.profile
  - $HOME/.ron
  - $HOME/.ssh
  - $HOME/.tmux.conf
  - $HOME/.vim
  - $HOME/.vim-go
  - $HOME/.vimrc
  - $HOME/.wget-hsts
  - $HOME/.z
  - $HOME/.zshrc
  - $HOME/.zprofile
  - $HOME/.zlogin
  - $HOME/.zlogout
  - /Library/Application Support/Sequel Pro/Data
  - /Library/Preferences/com.sequelpro.SequelPro.plist
  - /Library/Preferences/com.googlecode.iterm2.plist
  - /Library/Preferences/com.apple.dt.Xcode.plist
  - /Library/Application Support/Developer/Shared/Xcode/Plug-ins
  - /Library/Developer/Xcode/UserData/CodeSnippets
  - /Library/Developer/Xcode/UserData/FontAndColorThemes
  - /Library/Developer/Xcode/UserData/KeyBindings
  - /Library/Developer/Xcode/UserData/Debugger
  - /Library/Developer/Xcode/UserData/xcdebugger
  - /Library/Developer/Xcode/UserData/SearchScopes.xcsclist
  - /Library/Developer/Xcode/Templates
"#;
