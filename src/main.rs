use std::path::Path;

use futures_util::future::join_all;
use serde_json::json;

use contasfera_lib::config::{self, ReviewConfig};
use contasfera_lib::i18n;
use contasfera_lib::{IncomingFile, ReviewWorkflow};

#[tokio::main]
async fn main() {
    contasfera_lib::init_tracing();
    tracing::info!("{} review demo v{}", config::APP_NAME, config::APP_VERSION);

    let files: Vec<String> = std::env::args().skip(1).collect();
    if files.is_empty() {
        eprintln!("usage: contasfera <file>...");
        std::process::exit(2);
    }

    let config = ReviewConfig::from_env();
    let language = config.language;
    let workflow = ReviewWorkflow::new(config);

    let uploads = files.iter().map(|name| {
        let workflow = &workflow;
        async move {
            let file = IncomingFile::from_path(Path::new(name))
                .await
                .unwrap_or_else(|_| IncomingFile::new(name.as_str(), 0));
            workflow.ingest(file).await
        }
    });
    for result in join_all(uploads).await {
        if let Err(e) = result {
            tracing::warn!(error = %e, "Upload skipped");
        }
    }

    let (records, stats) = match (workflow.records(), workflow.stats()) {
        (Ok(records), Ok(stats)) => (records, stats),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let rows: Vec<_> = records
        .iter()
        .map(|r| {
            json!({
                "id": r.id,
                "name": r.name,
                "kind": contasfera_lib::classify::FileKind::from_filename(&r.name),
                "type": i18n::type_label(r.type_tag, language),
                "status": i18n::status_label(r.status, language),
            })
        })
        .collect();

    let report = json!({ "documents": rows, "stats": stats });
    match serde_json::to_string_pretty(&report) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
