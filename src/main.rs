use threadlink::cli::run;
use threadlink::repo::MappingError;
use threadlink::resolver::ResolveError;

/// Unreadable mapping table or state database: nothing can be decided safely
fn is_internal(e: &anyhow::Error) -> bool {
    e.chain().any(|cause| {
        cause.is::<ResolveError>() || cause.is::<MappingError>() || cause.is::<rusqlite::Error>()
    })
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run() {
        if is_internal(&e) {
            eprintln!("Internal error: {}", e);
            // Show error chain if available
            let mut source = e.source();
            if source.is_some() {
                eprintln!("\nCaused by:");
                let mut indent = 1;
                while let Some(err) = source {
                    eprintln!("{:indent$}  {}", "", err);
                    source = err.source();
                    indent += 1;
                }
            }
            std::process::exit(2);
        } else {
            // User error
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
