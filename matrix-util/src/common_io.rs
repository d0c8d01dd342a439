use flate2::read::GzDecoder;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Field separator for tabular text files
pub enum Delimiter {
    Str(String),
    Whitespace,
}

impl From<&str> for Delimiter {
    fn from(s: &str) -> Self {
        Delimiter::Str(s.to_string())
    }
}

impl Delimiter {
    fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self {
            Delimiter::Str(s) => line.split(s.as_str()).collect(),
            Delimiter::Whitespace => line.split_whitespace().collect(),
        }
    }
}

///
/// Open a file for reading, and return a buffered reader
/// * `input_file` - file name--either gzipped or not
pub fn open_buf_reader(input_file: &str) -> anyhow::Result<Box<dyn BufRead>> {
    let file = File::open(input_file)
        .map_err(|e| anyhow::anyhow!("failed to open {}: {}", input_file, e))?;

    match Path::new(input_file).extension().and_then(|x| x.to_str()) {
        Some("gz") => Ok(Box::new(BufReader::new(GzDecoder::new(file)))),
        _ => Ok(Box::new(BufReader::new(file))),
    }
}

///
/// Open a file for writing, and return a buffered writer
/// * `output_file` - file name--either gzipped or not; `stdout` is allowed
pub fn open_buf_writer(output_file: &str) -> anyhow::Result<Box<dyn Write>> {
    if output_file.eq_ignore_ascii_case("stdout") {
        return Ok(Box::new(BufWriter::new(std::io::stdout())));
    }

    let file = File::create(output_file)
        .map_err(|e| anyhow::anyhow!("failed to create {}: {}", output_file, e))?;

    match Path::new(output_file).extension().and_then(|x| x.to_str()) {
        Some("gz") => {
            let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
            Ok(Box::new(BufWriter::new(encoder)))
        }
        _ => Ok(Box::new(BufWriter::new(file))),
    }
}

///
/// Read every non-empty line of the input_file into memory
///
/// * `input_file` - file name--either gzipped or not
///
pub fn read_lines(input_file: &str) -> anyhow::Result<Vec<Box<str>>> {
    let buf = open_buf_reader(input_file)?;
    let mut lines = vec![];
    for x in buf.lines() {
        let x = x?;
        if !x.trim().is_empty() {
            lines.push(x.into_boxed_str());
        }
    }
    Ok(lines)
}

///
/// Write every line into the output_file
///
/// * `lines` - anything printable, one per line
/// * `output_file` - file name--either gzipped or not
///
pub fn write_lines<T>(lines: &[T], output_file: &str) -> anyhow::Result<()>
where
    T: std::fmt::Display,
{
    let mut buf = open_buf_writer(output_file)?;
    for line in lines {
        if let Err(e) = writeln!(buf, "{}", line) {
            if e.kind() == std::io::ErrorKind::BrokenPipe {
                return Ok(());
            }
            return Err(anyhow::anyhow!("unexpected error: {}", e));
        }
    }
    buf.flush()?;
    Ok(())
}

/// Header and rows of a delimited text table
pub struct ReadTableOut {
    pub header: Vec<Box<str>>,
    pub rows: Vec<Vec<Box<str>>>,
}

impl ReadTableOut {
    /// Position of a header column (case-insensitive)
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header
            .iter()
            .position(|h| h.as_ref().eq_ignore_ascii_case(name))
    }

    /// Position of a header column, or an error naming the file
    pub fn require_column(&self, name: &str, file: &str) -> anyhow::Result<usize> {
        self.column_index(name)
            .ok_or_else(|| anyhow::anyhow!("column '{}' not found in {}", name, file))
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }
}

///
/// Read a delimited table. Blank lines are skipped. With a header, the
/// first line names the columns (a leading `#` is stripped) and any later
/// line starting with `#` is a comment. Rows are split in parallel but
/// keep the file order.
///
/// * `input_file` - file name--either gzipped or not
/// * `delim` - field separator
/// * `has_header` - whether the first line is a header
///
pub fn read_table(
    input_file: &str,
    delim: impl Into<Delimiter>,
    has_header: bool,
) -> anyhow::Result<ReadTableOut> {
    let delim = delim.into();
    let lines = read_lines(input_file)?;

    let mut body_start = 0;
    let mut header = vec![];

    if has_header {
        let Some(first) = lines.first() else {
            return Err(anyhow::anyhow!("no header line in {}", input_file));
        };
        let first: &str = first.as_ref();
        let first = first.strip_prefix('#').unwrap_or(first);
        header = delim
            .split(first)
            .into_iter()
            .map(|x| x.trim().to_string().into_boxed_str())
            .collect();
        body_start = 1;
    }

    let rows: Vec<Vec<Box<str>>> = lines[body_start..]
        .par_iter()
        .filter(|line| !line.starts_with('#'))
        .map(|line| {
            delim
                .split(line)
                .into_iter()
                .map(|x| x.trim().to_string().into_boxed_str())
                .collect()
        })
        .collect();

    Ok(ReadTableOut { header, rows })
}

///
/// Create a directory for the file if needed
/// * `file` - file name
///
pub fn mkdir(file: &str) -> anyhow::Result<()> {
    let path = Path::new(file);
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    Ok(())
}

///
/// Create a persistent temporary file and return its path
/// * `suffix` - suffix of the file name
///
pub fn create_temp_dir_file(suffix: &str) -> anyhow::Result<std::path::PathBuf> {
    let temp_file = tempfile::Builder::new().suffix(suffix).tempfile()?;
    let (_, path) = temp_file.keep()?;
    Ok(path)
}

///
/// Remove a file if it exists
/// * `file` - file name
///
pub fn remove_file(file: &str) -> anyhow::Result<()> {
    let path = Path::new(file);
    if path.is_file() {
        std::fs::remove_file(path)?;
    }
    Ok(())
}
