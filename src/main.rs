use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{CommandFactory, Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use csv2sheet::config::{DEFAULT_INPUT_DIR, DEFAULT_OUTPUT_DIR};
use csv2sheet::{
    convert_folder, convert_single, ConvertError, ConvertOptions, FolderConfig, OutputFormat,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliFormat {
    /// Excel 2007+ workbook
    Xlsx,
    /// Excel 97-2003 workbook
    Xls,
}

impl From<CliFormat> for OutputFormat {
    fn from(f: CliFormat) -> Self {
        match f {
            CliFormat::Xlsx => OutputFormat::Modern,
            CliFormat::Xls => OutputFormat::Legacy,
        }
    }
}

#[derive(clap::Parser, Debug)]
#[command(
    name = "csv2sheet",
    version,
    about = "Convert CSV file(s) to XLSX or XLS. Detects comma or semicolon delimiters.",
    after_help = "Examples:
  Convert a single file:
    csv2sheet -i data.csv -o converted_data.xlsx

  Convert every *.csv file in the 'input' folder into the 'output' folder:
    csv2sheet"
)]
struct Args {
    /// Path to the input CSV file (single file conversion)
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Path for the output spreadsheet (single file conversion)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Folder scanned for CSV files when no -i/-o is given
    #[arg(long, value_name = "DIR", default_value = DEFAULT_INPUT_DIR)]
    input_dir: PathBuf,

    /// Folder receiving converted files when no -i/-o is given
    #[arg(long, value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Output format (default: from the output extension, else xlsx)
    #[arg(short, long, value_enum)]
    format: Option<CliFormat>,

    /// Override delimiter detection (',' or ';')
    #[arg(short, long)]
    delimiter: Option<char>,

    /// Keep all values as text (disable numeric conversion)
    #[arg(long)]
    no_type_conversion: bool,

    /// Print debug diagnostics to stderr
    #[arg(short, long)]
    verbose: bool,
}

enum Mode {
    Single { input: PathBuf, output: PathBuf },
    Folder,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        // --help and --version
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    init_logging(args.verbose);

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn run(args: Args) -> Result<ExitCode> {
    let mode = match (args.input.clone(), args.output.clone()) {
        (Some(input), Some(output)) => Mode::Single { input, output },
        (None, None) => Mode::Folder,
        _ => {
            let err = ConvertError::Usage(
                "For single file conversion, both -i/--input and -o/--output arguments are required."
                    .to_string(),
            );
            eprintln!("Error: {}", err);
            eprintln!("To use automatic folder processing, run the program without -i/-o.");
            let _ = Args::command().write_help(&mut io::stderr());
            return Ok(ExitCode::FAILURE);
        }
    };

    let delimiter = match args.delimiter {
        None => None,
        Some(c @ (',' | ';')) => Some(c as u8),
        Some(other) => {
            return Err(ConvertError::Usage(format!(
                "unsupported delimiter '{}', expected ',' or ';'",
                other
            ))
            .into())
        }
    };

    match mode {
        Mode::Single { input, output } => {
            let format = args
                .format
                .map(OutputFormat::from)
                .unwrap_or_else(|| OutputFormat::from_path(&output));
            let options = ConvertOptions {
                format,
                delimiter,
                no_type_conversion: args.no_type_conversion,
            };

            if let Err(e) = convert_single(&input, &output, &options) {
                eprintln!("Error: {}", e);
                println!("Conversion failed.");
                return Ok(ExitCode::FAILURE);
            }
        }
        Mode::Folder => {
            let format = args.format.map(OutputFormat::from).unwrap_or_default();
            let options = ConvertOptions {
                format,
                delimiter,
                no_type_conversion: args.no_type_conversion,
            };
            let folders = FolderConfig {
                input_dir: args.input_dir,
                output_dir: args.output_dir,
            };

            convert_folder(&folders, &options)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
