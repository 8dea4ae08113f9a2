//! csv-frame CLI - read, inspect and rewrite CSV files

use clap::{Args, Parser, Subcommand};
use csv_frame::encoding::{detect_encoding, transcode_to_utf8};
use csv_frame::{
    CsvFile, Dialect, EnclosePolicy, LineBreak, LineBreakCensus, Reader, Statement, Writer,
};
use std::io::{self, BufWriter, Cursor, Read, Seek};
use std::process::ExitCode;

/// RFC4180 CSV reader and writer.
///
/// Prints headers and rows, checks line endings, and converts between
/// dialects. Use `-` to read from standard input.
#[derive(Parser, Debug)]
#[command(name = "csv-frame")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the header row, one column per line
    Header {
        /// Input CSV file
        file: String,
        #[command(flatten)]
        dialect: DialectArgs,
    },
    /// Print rows re-serialized in the input dialect
    Rows {
        /// Input CSV file
        file: String,
        /// Number of rows to skip, header included
        #[arg(short = 'o', long, default_value = "0")]
        offset: usize,
        /// Maximum number of rows to print
        #[arg(short = 'l', long)]
        limit: Option<usize>,
        #[command(flatten)]
        dialect: DialectArgs,
    },
    /// Report line endings, encoding and width of each file
    Inspect {
        /// Input CSV file(s)
        #[arg(required = true)]
        files: Vec<String>,
        #[command(flatten)]
        dialect: DialectArgs,
    },
    /// Rewrite a file in another dialect
    Convert {
        /// Input CSV file
        file: String,
        /// Output delimiter (defaults to the input delimiter)
        #[arg(long)]
        to_delimiter: Option<char>,
        /// Terminate output rows with \r\n instead of \n
        #[arg(long)]
        crlf: bool,
        /// Enclose every output field
        #[arg(long)]
        always_enclose: bool,
        #[command(flatten)]
        dialect: DialectArgs,
    },
}

#[derive(Args, Debug)]
struct DialectArgs {
    /// Field delimiter (single ASCII character)
    #[arg(short = 'd', long, default_value = ",")]
    delimiter: char,

    /// Enclosure character (single ASCII character)
    #[arg(short = 'q', long, default_value = "\"")]
    enclosure: char,

    /// Escape character inside enclosures (default: none, doubling only)
    #[arg(long)]
    escape: Option<char>,

    /// Convert legacy encodings to UTF-8 before parsing
    #[arg(long)]
    transcode: bool,
}

impl DialectArgs {
    fn builder(&self) -> Result<csv_frame::DialectBuilder, Box<dyn std::error::Error>> {
        let mut builder = Dialect::builder();
        builder
            .delimiter(ascii_byte(self.delimiter, "delimiter")?)
            .enclosure(ascii_byte(self.enclosure, "enclosure")?)
            .escape(
                self.escape
                    .map(|c| ascii_byte(c, "escape"))
                    .transpose()?,
            );
        Ok(builder)
    }

    fn dialect(&self) -> Result<Dialect, Box<dyn std::error::Error>> {
        Ok(self.builder()?.build()?)
    }
}

/// Anything a reader can scan repeatedly.
trait Source: Read + Seek {}

impl<T: Read + Seek> Source for T {}

type BoxedReader = Reader<Box<dyn Source>>;

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match &cli.command {
        Command::Header { file, dialect } => print_header(file, dialect),
        Command::Rows {
            file,
            offset,
            limit,
            dialect,
        } => print_rows(file, *offset, *limit, dialect),
        Command::Inspect { files, dialect } => {
            let mut exit_code = ExitCode::SUCCESS;
            for file in files {
                if let Err(e) = inspect(file, dialect) {
                    eprintln!("Error processing {file}: {e}");
                    exit_code = ExitCode::FAILURE;
                }
            }
            return exit_code;
        }
        Command::Convert {
            file,
            to_delimiter,
            crlf,
            always_enclose,
            dialect,
        } => convert(file, *to_delimiter, *crlf, *always_enclose, dialect),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn ascii_byte(c: char, name: &str) -> Result<u8, String> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(format!("{name} must be a single ASCII character, got {c:?}"))
    }
}

/// Open `input` as a file, standard input (`-`) or, with the `http`
/// feature, a URL.
fn open_reader(input: &str, args: &DialectArgs) -> Result<BoxedReader, Box<dyn std::error::Error>> {
    let dialect = args.dialect()?;

    let in_memory = |data: Vec<u8>| -> Box<dyn Source> {
        if args.transcode {
            Box::new(Cursor::new(transcode_to_utf8(&data).0.into_owned()))
        } else {
            Box::new(Cursor::new(data))
        }
    };

    if input == "-" {
        let mut data = Vec::new();
        io::stdin().lock().read_to_end(&mut data)?;
        return Ok(Reader::new(in_memory(data), dialect));
    }

    if let Some(data) = fetch_remote(input)? {
        return Ok(Reader::new(in_memory(data), dialect));
    }

    let file = CsvFile::with_dialect(input, dialect.clone());
    let source: Box<dyn Source> = if args.transcode {
        Box::new(file.open_transcoded()?.into_inner())
    } else {
        Box::new(file.open()?.into_inner())
    };
    Ok(Reader::new(source, dialect))
}

#[cfg(feature = "http")]
fn fetch_remote(input: &str) -> Result<Option<Vec<u8>>, Box<dyn std::error::Error>> {
    if input.starts_with("http://") || input.starts_with("https://") {
        return Ok(Some(csv_frame::http::fetch_url(input, None)?));
    }
    Ok(None)
}

#[cfg(not(feature = "http"))]
fn fetch_remote(_input: &str) -> Result<Option<Vec<u8>>, Box<dyn std::error::Error>> {
    Ok(None)
}

fn print_header(input: &str, args: &DialectArgs) -> Result<(), Box<dyn std::error::Error>> {
    let header = open_reader(input, args)?.header()?;
    for (i, name) in header.iter().enumerate() {
        println!("{}: {}", i + 1, name);
    }
    Ok(())
}

fn print_rows(
    input: &str,
    offset: usize,
    limit: Option<usize>,
    args: &DialectArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = open_reader(input, args)?;

    let mut statement = Statement::new().offset(offset);
    if let Some(limit) = limit {
        statement = statement.limit(limit);
    }

    let mut writer = Writer::new(BufWriter::new(io::stdout().lock()), reader.dialect().clone());
    for row in statement.process(&mut reader)? {
        writer.write_row(row?)?;
    }
    writer.flush()?;
    Ok(())
}

fn convert(
    input: &str,
    to_delimiter: Option<char>,
    crlf: bool,
    always_enclose: bool,
    args: &DialectArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = open_reader(input, args)?;

    let mut builder = args.builder()?;
    if let Some(delimiter) = to_delimiter {
        builder.delimiter(ascii_byte(delimiter, "output delimiter")?);
    }
    if crlf {
        builder.newline(LineBreak::CRLF.as_str());
    }
    if always_enclose {
        builder.enclose_policy(EnclosePolicy::Always);
    }
    let output = builder.build()?;

    let mut writer = Writer::new(BufWriter::new(io::stdout().lock()), output);
    for row in reader.rows()? {
        writer.write_row(row?)?;
    }
    writer.flush()?;
    Ok(())
}

fn inspect(input: &str, args: &DialectArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = open_reader(input, args)?;

    let line_break = reader.line_break()?;
    let validation = match line_break.validate() {
        Ok(_) => "ok".to_string(),
        Err(e) => e.to_string(),
    };
    let columns = reader.header()?.len();

    let mut source = reader.into_inner();
    source.rewind()?;
    let mut data = Vec::new();
    source.read_to_end(&mut data)?;
    let census = LineBreakCensus::from_bytes(&data);
    let encoding = detect_encoding(&data);

    let file = CsvFile::new(input);
    let name = match file.basename() {
        Some(name) if input != "-" => name,
        _ => "<stdin>",
    };

    println!("File: {name}");
    println!("  Line break: {line_break}");
    println!("  Validation: {validation}");
    println!(
        "  Line breaks found: LF={} CRLF={} CR={}{}",
        census.lf,
        census.crlf,
        census.cr,
        if census.is_mixed() { " (mixed)" } else { "" }
    );
    println!("  Encoding: {}", encoding.name());
    println!("  UTF-8: {}", encoding.is_utf8);
    println!("  BOM: {}", encoding.has_bom);
    println!("  Columns: {columns}");
    println!();

    Ok(())
}
