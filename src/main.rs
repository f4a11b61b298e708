fn main() {
    if let Err(err) = backedup::cli::run() {
        println!("ERRO: {:#}", err);
        std::process::exit(1);
    }
}
