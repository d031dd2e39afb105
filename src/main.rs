use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use scan_client::view::PreviewRegion;
use scan_client::{
    ClientConfig, ClientError, Controller, HttpPredictionService, ResultsView, Screen,
    SelectedFile,
};
use tokio::io::{AsyncBufReadExt, BufReader};

const BAR_CELLS: usize = 40;

#[derive(Parser, Debug)]
#[command(name = "scan_client")]
#[command(author, version, about = "Classify brain scans with a prediction service")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Prediction endpoint (overrides PREDICT_URL)
    #[arg(long)]
    url: Option<String>,

    /// Request timeout in seconds (overrides REQUEST_TIMEOUT_SECS)
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one image and print the prediction
    Analyze {
        /// Image to upload
        path: PathBuf,

        /// Print results as JSON instead of the formatted view
        #[arg(long)]
        json: bool,
    },

    /// Interactive session: pick, drop, analyze, clear, show, quit
    Session,

    /// Check that the service is up
    Health,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let service = match HttpPredictionService::new(&config) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Failed to create HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let code = match args.command {
        Command::Analyze { path, json } => {
            let mut controller = Controller::with_config(service, &config);
            run_analyze(&mut controller, &path, json).await
        }
        Command::Session => {
            let mut controller = Controller::with_config(service, &config);
            run_session(&mut controller).await
        }
        Command::Health => run_health(&service).await,
    };

    std::process::exit(code);
}

fn load_config(args: &Args) -> Result<ClientConfig, ClientError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(ref url) = args.url {
        config = config.with_predict_url(url)?;
    }
    if let Some(secs) = args.timeout {
        if secs == 0 {
            return Err(ClientError::Config("--timeout must be greater than zero".to_string()));
        }
        config = config.with_timeout(Some(Duration::from_secs(secs)));
    }
    Ok(config)
}

async fn run_analyze(
    controller: &mut Controller<HttpPredictionService>,
    path: &Path,
    json: bool,
) -> i32 {
    let file = match SelectedFile::from_path(path).await {
        Ok(file) => file,
        Err(e) => {
            alert(&e);
            return 1;
        }
    };

    if let Err(e) = controller.pick_file(Some(file)).await {
        alert(&e);
        return 1;
    }

    if !json {
        eprintln!("Analyzing via {}...", controller.service().predict_url());
    }

    if let Err(e) = controller.analyze_image().await {
        alert(&e);
        return 1;
    }

    let screen = controller.screen();
    if json {
        match screen.results.map(serde_json::to_string_pretty) {
            Some(Ok(out)) => println!("{}", out),
            Some(Err(e)) => {
                eprintln!("Error serializing results: {}", e);
                return 1;
            }
            None => return 1,
        }
    } else {
        print_screen(&screen);
    }
    0
}

async fn run_session(controller: &mut Controller<HttpPredictionService>) -> i32 {
    eprintln!("\x1b[1mScan client\x1b[0m");
    eprintln!("commands: pick <file>, drop <file>..., analyze, clear, show, quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("> ");
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                eprintln!("Failed to read input: {}", e);
                return 1;
            }
        };

        let mut words = line.split_whitespace();
        let Some(cmd) = words.next() else { continue };
        let rest: Vec<&str> = words.collect();

        let result = match cmd {
            "pick" => match rest.first() {
                Some(path) => match SelectedFile::from_path(Path::new(path)).await {
                    Ok(file) => controller.pick_file(Some(file)).await,
                    Err(e) => Err(e),
                },
                None => controller.pick_file(None).await,
            },
            "drop" => {
                controller.drag_over();
                let mut files = Vec::new();
                for path in &rest {
                    match SelectedFile::from_path(Path::new(path)).await {
                        Ok(file) => files.push(file),
                        Err(e) => {
                            alert(&e);
                        }
                    }
                }
                controller.drop_files(files).await
            }
            "analyze" => {
                eprintln!("Analyzing...");
                controller.analyze_image().await.map(|_| ())
            }
            "clear" => {
                controller.clear_image();
                Ok(())
            }
            "show" => Ok(()),
            "quit" | "exit" => break,
            other => {
                eprintln!("Unknown command '{}'", other);
                continue;
            }
        };

        if let Err(e) = result {
            alert(&e);
        }
        print_screen(&controller.screen());
    }

    0
}

async fn run_health(service: &HttpPredictionService) -> i32 {
    match service.check_health().await {
        Ok(true) => {
            println!("\x1b[32mOK\x1b[0m {}", service.predict_url());
            0
        }
        Ok(false) => {
            println!("\x1b[33mUnhealthy\x1b[0m {}", service.predict_url());
            1
        }
        Err(e) => {
            eprintln!("\x1b[31mUnreachable\x1b[0m {}: {}", service.predict_url(), e);
            1
        }
    }
}

fn alert(err: &ClientError) {
    eprintln!("\x1b[31m{}\x1b[0m", err);
}

fn print_screen(screen: &Screen<'_>) {
    match &screen.preview {
        Some(preview) => print_preview(preview),
        None => println!("\x1b[90m(no image selected)\x1b[0m"),
    }

    if screen.loading {
        println!("\x1b[33mAnalyzing...\x1b[0m");
    }

    if let Some(results) = screen.results {
        print_results(results);
    }
}

fn print_preview(preview: &PreviewRegion<'_>) {
    let dims = preview
        .preview
        .dimensions
        .map(|(w, h)| format!("{}x{}", w, h))
        .unwrap_or_else(|| "?".to_string());
    println!(
        "\x1b[1m{}\x1b[0m  {}  {} bytes  {}",
        preview.file_name, preview.media_type, preview.size, dims
    );
}

fn print_results(results: &ResultsView) {
    let color = match results.severity.as_str() {
        "High" => "\x1b[31m",
        "None" => "\x1b[32m",
        _ => "\x1b[33m",
    };
    let reset = "\x1b[0m";

    println!("{}", "─".repeat(50));
    println!("\x1b[1m{}\x1b[0m", results.name);
    println!("  {}", results.description);
    println!("  Severity: {}{}{}", color, results.severity, reset);
    println!("  Action:   {}", results.action);
    println!(
        "  [{}] {}",
        confidence_bar(results.confidence_width),
        results.confidence_text
    );
    println!();
    println!("{}", results.heading);
    for row in &results.rows {
        println!("  {:<24} {:>7}", row.label, row.probability);
    }
}

fn confidence_bar(width_percent: f64) -> String {
    let filled = ((width_percent / 100.0) * BAR_CELLS as f64).round() as usize;
    let filled = filled.min(BAR_CELLS);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_CELLS - filled))
}
