use anyhow::Result;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand, ValueEnum};
use nmlpack::generator::{
    CombineArchive, DEFAULT_ARCHIVE_EXTENSION, create_combine_archive,
    create_combine_archive_in, write_manifest,
};
use nmlpack::model::Manifest;
use nmlpack::neuron::NeuronEngine;
use nmlpack::resolver::ModelResolver;

#[derive(Parser, Debug)]
#[command(author, version, about = "Package NeuroML/LEMS models into COMBINE archives & inspect NEURON state", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the resolved file list of a model (root first)
    List {
        /// Root model file, relative to the base directory
        model: Utf8PathBuf,
        /// Base search directory
        #[arg(long, default_value = ".")]
        dir: Utf8PathBuf,
    },
    /// Write manifest.xml for a model into the base directory
    Manifest {
        model: Utf8PathBuf,
        #[arg(long, default_value = ".")]
        dir: Utf8PathBuf,
    },
    /// Create a COMBINE archive next to the root model file
    Pack {
        /// Root model file (.nml or LEMS .xml)
        model: Utf8PathBuf,
        /// Base search directory (defaults to the model's parent directory;
        /// the model path is relative to it and the archive is written into it)
        #[arg(long)]
        dir: Option<Utf8PathBuf>,
        /// Archive name (defaults to the model file stem)
        #[arg(long)]
        name: Option<String>,
        /// Archive file extension
        #[arg(long, default_value = DEFAULT_ARCHIVE_EXTENSION)]
        extension: String,
    },
    /// List the entries of an existing COMBINE archive
    Contents {
        archive: Utf8PathBuf,
    },
    /// Report section morphology from a compiled NEURON model
    Morph {
        /// Section to query (default: currently accessed section)
        #[arg(long)]
        section: Option<String>,
        /// Hoc file to load before querying (repeatable)
        #[arg(long = "hoc")]
        hoc_files: Vec<Utf8PathBuf>,
        /// Hoc command to run after loading (repeatable)
        #[arg(long = "exec")]
        commands: Vec<String>,
        /// nrniv executable
        #[arg(long, default_value = "nrniv")]
        nrniv: Utf8PathBuf,
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Report distributed mechanism state from a compiled NEURON model
    Mechanisms {
        #[arg(long = "hoc")]
        hoc_files: Vec<Utf8PathBuf>,
        #[arg(long = "exec")]
        commands: Vec<String>,
        #[arg(long, default_value = "nrniv")]
        nrniv: Utf8PathBuf,
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Json,
    Text,
}

fn engine(
    nrniv: &Utf8PathBuf,
    hoc_files: &[Utf8PathBuf],
    commands: &[String],
) -> Result<NeuronEngine> {
    let mut engine = NeuronEngine::new().with_executable(nrniv);
    for hoc in hoc_files {
        engine.load_hoc_file(hoc)?;
    }
    for cmd in commands {
        engine.exec(cmd.clone());
    }
    Ok(engine)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::List { model, dir } => {
            let files = ModelResolver::from_dir(&dir).resolve(&model)?;
            for f in files {
                println!("{}", f);
            }
        }
        Command::Manifest { model, dir } => {
            let files = ModelResolver::from_dir(&dir).resolve(&model)?;
            let manifest = Manifest::from_file_list(&files[0], &files);
            let path = write_manifest(&manifest, &dir)?;
            println!("{}", path);
        }
        Command::Pack {
            model,
            dir,
            name,
            extension,
        } => {
            let path = match dir {
                Some(dir) => {
                    create_combine_archive_in(&dir, &model, name.as_deref(), &extension)?
                }
                None => create_combine_archive(&model, name.as_deref(), &extension)?,
            };
            println!("{}", path);
        }
        Command::Contents { archive } => {
            let archive = CombineArchive::from_file(archive.as_std_path())?;
            for entry in &archive.manifest.entries {
                let master = if entry.master { " (master)" } else { "" };
                println!("{}\t{}{}", entry.location, entry.format, master);
            }
        }
        Command::Morph {
            section,
            hoc_files,
            commands,
            nrniv,
            format,
        } => {
            let morph = engine(&nrniv, &hoc_files, &commands)?.morphology(section.as_deref())?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&morph)?),
                OutputFormat::Text => print!("{}", morph.render_text()),
            }
        }
        Command::Mechanisms {
            hoc_files,
            commands,
            nrniv,
            format,
        } => {
            let report = engine(&nrniv, &hoc_files, &commands)?.mechanisms()?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Text => print!("{}", report.render_text()),
            }
        }
    }
    Ok(())
}
