use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::{Path, PathBuf};

use crate::config::{Config, DEFAULT_DECOMPILER, DEFAULT_JAVA};
use crate::pipeline::{Mode, default_destination};

#[derive(Parser, Debug)]
#[command(name = "jardecomp")]
#[command(version)]
#[command(about = "Decompile Java archives with CFR", long_about = None)]
#[command(after_help = "Examples:\n  \
  jardecomp inplace app.jar              replace classes in app.jar with their sources\n  \
  jardecomp export app.jar -o app-src    sources and resources into app-src/\n  \
  jardecomp --cfr tools/cfr.jar project app.jar   Gradle project in app_project/")]
pub struct Cli {
    /// Path to the CFR decompiler jar
    #[arg(
        long = "cfr",
        value_name = "JAR",
        env = "JARDECOMP_CFR",
        default_value = DEFAULT_DECOMPILER,
        global = true
    )]
    pub cfr: PathBuf,

    /// Java launcher used to run CFR
    #[arg(
        long,
        value_name = "PROGRAM",
        env = "JARDECOMP_JAVA",
        default_value = DEFAULT_JAVA,
        global = true
    )]
    pub java: PathBuf,

    /// Let CFR print its own progress output
    #[arg(long, global = true)]
    pub verbose_decompiler: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count, global = true)]
    pub quiet: u8,

    /// More logging (-vv => trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replace .class with .java inside the jar
    Inplace {
        /// Jar to rewrite
        #[arg(value_name = "JAR")]
        jar: PathBuf,
    },
    /// Unpack sources and resources into a folder
    Export {
        /// Jar to decompile
        #[arg(value_name = "JAR")]
        jar: PathBuf,

        /// Output folder [default: <jar-stem>_extracted]
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },
    /// Create a Gradle project with src/main/java and src/main/resources
    Project {
        /// Jar to decompile
        #[arg(value_name = "JAR")]
        jar: PathBuf,

        /// Project folder [default: <jar-stem>_project]
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },
}

impl Cli {
    pub fn config(&self) -> Config {
        Config::new(&self.cfr)
            .with_java(&self.java)
            .with_silent(!self.verbose_decompiler)
    }

    pub fn archive(&self) -> &Path {
        match &self.command {
            Command::Inplace { jar }
            | Command::Export { jar, .. }
            | Command::Project { jar, .. } => jar,
        }
    }

    pub fn mode(&self) -> Mode {
        match &self.command {
            Command::Inplace { .. } => Mode::Inplace,
            Command::Export { jar, output } => Mode::Export {
                output: output
                    .clone()
                    .unwrap_or_else(|| default_destination(jar, "_extracted")),
            },
            Command::Project { jar, output } => Mode::Project {
                root: output
                    .clone()
                    .unwrap_or_else(|| default_destination(jar, "_project")),
            },
        }
    }

    /// `info` by default, each -q or -v moves one step
    pub fn log_level(&self) -> LevelFilter {
        const LEVELS: [LevelFilter; 6] = [
            LevelFilter::Off,
            LevelFilter::Error,
            LevelFilter::Warn,
            LevelFilter::Info,
            LevelFilter::Debug,
            LevelFilter::Trace,
        ];
        let index = (3 + self.verbose as i32 - self.quiet as i32).clamp(0, 5);
        LEVELS[index as usize]
    }
}
