use anyhow::{Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand};
use retarget::rewrite::{
    add_missing_abstract_methods, remove_supertypes_unit, remove_unnecessary_overrides,
    remove_unnecessary_super_calls, retarget_unit, run_pass, RetargetOptions, RewriteContext, SupertypeFilter,
};
use retarget::types::TypeTable;
use retarget::{load_unit, print_unit, Config};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "retarget")]
#[command(about = "Change the supertype of Java classes and repair what breaks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Common {
    /// Input .java file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Directory of .java declarations used to resolve types
    #[arg(long, value_name = "DIR")]
    classpath: Option<PathBuf>,

    /// Keep fully qualified references as written by the passes
    #[arg(long)]
    no_shorten: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace a superclass and repair overrides, stubs and super calls
    ChangeSupertype {
        #[command(flatten)]
        common: Common,

        /// Fully qualified name of the current superclass
        #[arg(long, value_name = "FQN")]
        from: String,

        /// Fully qualified name of the new supertype
        #[arg(long, value_name = "FQN")]
        to: String,

        #[arg(long)]
        keep_type_parameters: bool,

        /// Implement the new type instead of extending it
        #[arg(long)]
        convert_to_interface: bool,

        #[arg(long)]
        add_abstract_methods: bool,

        #[arg(long)]
        remove_unnecessary_overrides: bool,

        /// Enable every option above
        #[arg(long)]
        all: bool,
    },

    /// Add stubs for inherited abstract methods
    AddMissingMethods {
        #[command(flatten)]
        common: Common,
    },

    /// Remove @Override from methods that override nothing
    RemoveOverrides {
        #[command(flatten)]
        common: Common,

        /// Leave methods of anonymous classes alone
        #[arg(long)]
        ignore_anonymous: bool,
    },

    /// Remove super calls the superclass no longer supports
    RemoveSuperCalls {
        #[command(flatten)]
        common: Common,
    },

    /// Remove supertypes by exact type or by package
    #[command(group(ArgGroup::new("filter").required(true).args(["type_fqn", "package"])))]
    RemoveSupertype {
        #[command(flatten)]
        common: Common,

        /// Fully qualified type to remove
        #[arg(long = "type", value_name = "FQN")]
        type_fqn: Option<String>,

        /// Remove every supertype whose package starts with this prefix
        #[arg(long, value_name = "PREFIX")]
        package: Option<String>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::ChangeSupertype {
            common,
            from,
            to,
            keep_type_parameters,
            convert_to_interface,
            add_abstract_methods,
            remove_unnecessary_overrides,
            all,
        } => {
            let options = if all {
                RetargetOptions::all_enabled()
            } else {
                RetargetOptions {
                    keep_type_parameters,
                    convert_to_interface,
                    add_abstract_methods,
                    remove_unnecessary_overrides,
                }
            };
            run(&common, Config::from_env()?, |unit, ctx| {
                let (unit, report) = retarget_unit(unit, &from, &to, options, ctx);
                if common.verbose {
                    eprint!("{}", report);
                }
                (unit, report.retargeted())
            })
        }
        Commands::AddMissingMethods { common } => run(&common, Config::from_env()?, |unit, ctx| {
            run_pass(unit, ctx, add_missing_abstract_methods)
        }),
        Commands::RemoveOverrides {
            common,
            ignore_anonymous,
        } => {
            let config = Config::from_env()?.with_ignore_anonymous_class_methods(ignore_anonymous);
            run(&common, config, |unit, ctx| run_pass(unit, ctx, remove_unnecessary_overrides))
        }
        Commands::RemoveSuperCalls { common } => run(&common, Config::from_env()?, |unit, ctx| {
            run_pass(unit, ctx, remove_unnecessary_super_calls)
        }),
        Commands::RemoveSupertype {
            common,
            type_fqn,
            package,
        } => {
            let filter = match (type_fqn, package) {
                (Some(fqn), _) => SupertypeFilter::Type(fqn),
                (None, Some(prefix)) => SupertypeFilter::Package(prefix),
                (None, None) => anyhow::bail!("either --type or --package is required"),
            };
            run(&common, Config::from_env()?, |unit, ctx| remove_supertypes_unit(unit, &filter, ctx))
        }
    }
}

fn load_table(classpath: Option<&Path>) -> Result<TypeTable> {
    match classpath {
        Some(dir) => {
            let table = TypeTable::load_dir_cached(dir)
                .with_context(|| format!("failed to load classpath {}", dir.display()))?;
            Ok((*table).clone())
        }
        None => Ok(TypeTable::new()),
    }
}

fn run<F>(common: &Common, config: Config, pass: F) -> Result<()>
where
    F: FnOnce(retarget::ast::CompilationUnit, &RewriteContext<'_>) -> (retarget::ast::CompilationUnit, usize),
{
    let mut config = config.with_shorten_references(!common.no_shorten);
    if let Some(dir) = &common.classpath {
        config = config.with_classpath(dir);
    }

    let source =
        fs::read_to_string(&common.input).with_context(|| format!("failed to read {}", common.input.display()))?;
    let table = load_table(config.classpath.as_deref())?;
    let (unit, table) = load_unit(&source, &table).with_context(|| format!("failed to parse {}", common.input.display()))?;

    let ctx = RewriteContext::new(&table, &config);
    let (unit, changes) = pass(unit, &ctx);
    if common.verbose {
        eprintln!("{}: {} change(s)", common.input.display(), changes);
    }
    print!("{}", print_unit(&unit, &config));
    Ok(())
}
