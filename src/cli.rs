use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::{Args, CommandFactory, Parser, Subcommand};

use img::convert::{self, Converted};
use img::normalize::{self, Normalized, Removal};
use img::resize::{self, Resize};
use img::{Result, Tool, Tools};

#[derive(Parser)]
#[command(
    name = "img",
    version,
    about = "Image helper: convert/resize to WebP through cwebp, normalize filenames",
    long_about = "Image helper: convert/resize to WebP through cwebp, normalize filenames.\n\n\
                  Without a subcommand, any arguments are forwarded to cwebp.",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(flatten)]
    tools: ToolArgs,

    #[command(subcommand)]
    command: Option<Command>,

    /// Arguments forwarded verbatim to cwebp.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "CWEBP_ARGS")]
    forward: Vec<OsString>,
}

#[derive(Args)]
struct ToolArgs {
    /// cwebp executable to run.
    #[arg(long, env = "IMG_CWEBP", default_value = "cwebp", global = true, value_name = "PROGRAM")]
    cwebp: OsString,
    /// fd executable used by convert-all.
    #[arg(long, env = "IMG_FD", default_value = "fd", global = true, value_name = "PROGRAM")]
    fd: OsString,
}

impl From<ToolArgs> for Tools {
    fn from(args: ToolArgs) -> Self {
        Tools {
            cwebp: Tool::new(args.cwebp),
            fd: Tool::new(args.fd),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Convert images to <basename>.webp
    Convert {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Convert all jpg/png files in the current directory to webp (requires fd)
    ConvertAll,
    /// Resize an image and write <basename>-w{width}-h{height}.{ext}
    Resize(ResizeArgs),
    /// Normalize filenames: lowercase, whitespace -> '-', collapse repeated '-'
    Normalize {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        removal: RemovalArgs,
    },
    /// Normalize all files in the current directory (non-recursive)
    NormalizeAll {
        #[command(flatten)]
        removal: RemovalArgs,
    },
}

#[derive(Args)]
struct ResizeArgs {
    /// Input file to resize.
    #[arg(long)]
    file: PathBuf,
    /// Width to resize to (0 to auto).
    #[arg(long)]
    width: u32,
    /// Height to resize to (0 to auto).
    #[arg(long)]
    height: u32,
    /// Extra arguments passed to cwebp.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "CWEBP_ARGS")]
    extra: Vec<OsString>,
}

#[derive(Args)]
struct RemovalArgs {
    /// Remove original files after creating the normalized copy.
    #[arg(long)]
    delete: bool,
}

impl From<RemovalArgs> for Removal {
    fn from(args: RemovalArgs) -> Self {
        if args.delete {
            Removal::Delete
        } else {
            Removal::Keep
        }
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let tools = Tools::from(cli.tools);
    let print_normalized = |n: &Normalized| println!("{n}");
    let print_converted = |c: &Converted| println!("{c}");

    match cli.command {
        Some(Command::Convert { files }) => convert::convert(&tools, files, print_converted),
        Some(Command::ConvertAll) => convert::convert_all(&tools, Path::new(".")),
        Some(Command::Resize(args)) => {
            let job = Resize {
                file: args.file,
                width: args.width,
                height: args.height,
                extra: args.extra,
            };
            let done = resize::resize(&tools, &job)?;
            println!("{done}");
            Ok(())
        }
        Some(Command::Normalize { files, removal }) => {
            normalize::normalize_many(files, removal.into(), print_normalized)
        }
        Some(Command::NormalizeAll { removal }) => {
            normalize::normalize_all(".", removal.into(), print_normalized)
        }
        None if cli.forward.is_empty() => {
            Cli::command().print_help()?;
            Ok(())
        }
        None => convert::forward(&tools, cli.forward),
    }
}
