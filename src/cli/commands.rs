use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "hashfs", version)]
#[command(about = "Keeps a SQLite index of file sizes, timestamps and SHA-256 hashes", long_about = None)]
pub struct Cli {
    /// Print the stored index as a JSON directory tree instead of walking
    #[arg(long = "tojson")]
    pub to_json: bool,

    /// Directory to index (with --tojson: the store file)
    pub first: Option<String>,

    /// Store file to create or update
    pub second: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Mode {
    Index {
        directory: String,
        store: Option<String>,
    },
    ToJson {
        store: Option<String>,
    },
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if self.to_json {
            Mode::ToJson {
                store: self.first.clone(),
            }
        } else {
            Mode::Index {
                directory: self.first.clone().unwrap_or_else(|| ".".to_string()),
                store: self.second.clone(),
            }
        }
    }
}
