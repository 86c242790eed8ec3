use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use cmapdb::resource::{write_cmap, write_unicode_maps};
use cmapdb::{CMapDb, Result, parse_cmap, parse_unicode_map};
use log::error;

#[derive(Parser, Debug)]
#[clap(author, version, about = "CMap utility program using the cmapdb library", arg_required_else_help = true)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse CMap source files and print their mappings
    Dump {
        files: Vec<PathBuf>,
        /// Read the files as ToUnicode maps
        #[clap(short, long)]
        unicode: bool,
    },
    /// Convert a CMap source file into a compressed resource
    Convert {
        file: PathBuf,
        #[clap(short, long)]
        output: PathBuf,
        /// Read the file as a ToUnicode map
        #[clap(short, long)]
        unicode: bool,
    },
    /// Print a resource found through CMAP_PATH
    Resource {
        name: String,
        /// Load to-unicode-<name> instead of <name>
        #[clap(short, long)]
        unicode: bool,
        /// Pick the vertical table of a to-unicode resource
        #[clap(long)]
        vertical: bool,
    },
}

fn dump(files: &[PathBuf], unicode: bool) -> Result<()> {
    let mut out = BufWriter::new(io::stdout().lock());
    for file in files {
        let data = fs::read(file)?;
        if unicode {
            parse_unicode_map(&data).dump(&mut out)?;
        } else {
            parse_cmap(&data).dump(&mut out)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn convert(file: &Path, output: &Path, unicode: bool) -> Result<()> {
    let data = fs::read(file)?;
    let writer = BufWriter::new(File::create(output)?);
    if unicode {
        // ToUnicode maps serve both writing modes
        let map = parse_unicode_map(&data);
        write_unicode_maps(&map, &map, writer)
    } else {
        write_cmap(&parse_cmap(&data), writer)
    }
}

fn resource(name: &str, unicode: bool, vertical: bool) -> Result<()> {
    let db = CMapDb::global();
    let mut out = BufWriter::new(io::stdout().lock());
    if unicode {
        db.get_unicode_map(name, vertical)?.dump(&mut out)?;
    } else {
        match db.get_cmap(name)?.as_table() {
            Some(cmap) => cmap.dump(&mut out)?,
            None => writeln!(out, "{} maps two byte codes to themselves", name)?,
        }
    }
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let result = match &args.command {
        Command::Dump { files, unicode } => dump(files, *unicode),
        Command::Convert { file, output, unicode } => convert(file, output, *unicode),
        Command::Resource {
            name,
            unicode,
            vertical,
        } => resource(name, *unicode, *vertical),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
