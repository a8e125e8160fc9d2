use clap::{Arg, ArgAction, Command};

fn pipeline_args() -> Vec<Arg> {
    vec![
        Arg::new("primary")
            .long("primary")
            .value_name("ENGINE")
            .help("Primary text engine: pdf_extract or pdftotext [env: PDFSCAN_PRIMARY]")
            .action(ArgAction::Set),
        Arg::new("secondary")
            .long("secondary")
            .value_name("ENGINE")
            .help("Fallback text engine, or 'none' [env: PDFSCAN_SECONDARY]")
            .action(ArgAction::Set),
        Arg::new("max-pages")
            .long("max-pages")
            .value_name("N")
            .help("Pages of text to extract, 0 for all (default: 3) [env: PDFSCAN_MAX_PAGES]")
            .action(ArgAction::Set),
        Arg::new("raster-scale")
            .long("raster-scale")
            .value_name("FACTOR")
            .help("Upscale of the rendered first page (default: 2.0) [env: PDFSCAN_RASTER_SCALE]")
            .action(ArgAction::Set),
        Arg::new("step-timeout")
            .long("step-timeout")
            .value_name("SECS")
            .help("Time budget per external tool call (default: 30) [env: PDFSCAN_STEP_TIMEOUT_SECS]")
            .action(ArgAction::Set),
        Arg::new("scratch-dir")
            .long("scratch-dir")
            .value_name("DIR")
            .help("Directory for scratch copies of the input (default: system temp) [env: PDFSCAN_SCRATCH_DIR]")
            .action(ArgAction::Set),
    ]
}

pub fn build_cli() -> Command {
    Command::new("pdfscan")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extracts text, a first-page image and bank hints from PDF statements")
        .long_about(
            "pdfscan reads a PDF and returns, as JSON:\n\
            - the text of the first pages (with a fallback text engine)\n\
            - a PNG rendering of the first page, base64 encoded\n\
            - banking keywords found in the text and a guess of the issuing bank",
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .global(true)
                .help("Only log errors")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("serve")
                .about("Run the HTTP service (default)")
                .arg(
                    Arg::new("host")
                        .long("host")
                        .value_name("HOST")
                        .help("Address to bind (default: 0.0.0.0) [env: PDFSCAN_HOST]")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("port")
                        .long("port")
                        .short('p')
                        .value_name("PORT")
                        .help("Port to listen on (default: 3000) [env: PORT]")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("request-timeout")
                        .long("request-timeout")
                        .value_name("SECS")
                        .help("Time budget per request (default: 60) [env: PDFSCAN_REQUEST_TIMEOUT_SECS]")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("max-body-bytes")
                        .long("max-body-bytes")
                        .value_name("BYTES")
                        .help("Largest accepted request body (default: 20 MiB) [env: PDFSCAN_MAX_BODY_BYTES]")
                        .action(ArgAction::Set),
                )
                .args(pipeline_args()),
        )
        .subcommand(
            Command::new("extract")
                .about("Process a local PDF and print the result as JSON")
                .arg(
                    Arg::new("path")
                        .value_name("PATH")
                        .help("PDF file to process")
                        .required(true)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("mode")
                        .long("mode")
                        .short('m')
                        .value_name("MODE")
                        .help("text, image or hybrid")
                        .default_value("hybrid")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("pretty")
                        .long("pretty")
                        .help("Pretty-print the JSON output")
                        .action(ArgAction::SetTrue),
                )
                .args(pipeline_args()),
        )
        .subcommand(
            Command::new("capabilities")
                .about("Print which PDF engines are available on this host")
                .arg(
                    Arg::new("step-timeout")
                        .long("step-timeout")
                        .value_name("SECS")
                        .action(ArgAction::Set),
                ),
        )
}
