use anyhow::{anyhow, Context, Result};
use blogdir::{build_directory, Config, Directory, MissingMetadata, Options};
use clap::{crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use std::path::{Path, PathBuf};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    if let Err(e) = run(&app().get_matches()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn app() -> App<'static, 'static> {
    let output = Arg::with_name("output")
        .long("output")
        .short("o")
        .takes_value(true)
        .value_name("FILE")
        .help("The directory JSON file (overrides the project file)");

    App::new("blogdir")
        .version(crate_version!())
        .about("Indexes markdown blog posts into a JSON directory of posts by tag")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("config")
                .long("config")
                .short("c")
                .takes_value(true)
                .value_name("FILE")
                .global(true)
                .help("The project file (default: nearest blogdir.yaml)"),
        )
        .subcommand(
            SubCommand::with_name("build")
                .about("Adds new posts to the directory")
                .arg(
                    Arg::with_name("source")
                        .long("source")
                        .short("s")
                        .takes_value(true)
                        .value_name("DIR")
                        .help("The folder of markdown posts (overrides the project file)"),
                )
                .arg(output.clone())
                .arg(
                    Arg::with_name("skip-invalid")
                        .long("skip-invalid")
                        .help("Index posts missing a metadata marker with empty values"),
                )
                .arg(
                    Arg::with_name("pretty")
                        .long("pretty")
                        .help("Pretty-print the directory JSON"),
                )
                .arg(
                    Arg::with_name("dry-run")
                        .long("dry-run")
                        .help("Parse new posts but don't write the directory"),
                ),
        )
        .subcommand(
            SubCommand::with_name("tags")
                .about("Lists every tag with its post count")
                .arg(output.clone()),
        )
        .subcommand(
            SubCommand::with_name("posts")
                .about("Lists the posts carrying a tag")
                .arg(Arg::with_name("TAG").required(true))
                .arg(output.clone()),
        )
        .subcommand(
            SubCommand::with_name("show")
                .about("Prints a post's directory entry as JSON")
                .arg(Arg::with_name("NAME").required(true))
                .arg(output),
        )
}

fn run(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        ("build", Some(sub)) => build(&load_config(matches, sub)?, sub),
        ("tags", Some(sub)) => tags(&load_directory(&load_config(matches, sub)?)?),
        ("posts", Some(sub)) => posts(
            &load_directory(&load_config(matches, sub)?)?,
            sub.value_of("TAG").unwrap_or_default(),
        ),
        ("show", Some(sub)) => show(
            &load_directory(&load_config(matches, sub)?)?,
            sub.value_of("NAME").unwrap_or_default(),
        ),
        (name, _) => Err(anyhow!("unknown command `{}`", name)),
    }
}

/// Loads the project configuration and applies the subcommand's overrides.
fn load_config(matches: &ArgMatches, sub: &ArgMatches) -> Result<Config> {
    let mut config = match sub.value_of("config").or_else(|| matches.value_of("config")) {
        Some(path) => Config::from_project_file(Path::new(path))?,
        None => {
            let cwd = std::env::current_dir().context("getting working directory")?;
            Config::from_directory(&cwd)?
        }
    };

    if let Some(source) = sub.value_of("source") {
        config.source_directory = PathBuf::from(source);
    }
    if let Some(output) = sub.value_of("output") {
        config.directory_file = PathBuf::from(output);
    }
    if sub.is_present("skip-invalid") {
        config.missing_metadata = MissingMetadata::Skip;
    }
    if sub.is_present("pretty") {
        config.pretty = true;
    }
    Ok(config)
}

fn load_directory(config: &Config) -> Result<Directory> {
    Ok(Directory::load(&config.directory_file)?)
}

fn build(config: &Config, sub: &ArgMatches) -> Result<()> {
    let options = Options {
        dry_run: sub.is_present("dry-run"),
    };
    let report = build_directory(config, options)?;
    println!("{}", report);
    Ok(())
}

fn tags(directory: &Directory) -> Result<()> {
    for tag_count in directory.tag_counts() {
        println!("{}", tag_count);
    }
    println!("max\t{}", directory.max_tag_count());
    Ok(())
}

fn posts(directory: &Directory, tag: &str) -> Result<()> {
    for post in directory.files_by_tag(tag) {
        println!("{}\t{}", post.name, post.desc);
    }
    Ok(())
}

fn show(directory: &Directory, name: &str) -> Result<()> {
    match directory.find_file_by_name(name) {
        Some(post) => {
            println!("{}", serde_json::to_string_pretty(post)?);
            Ok(())
        }
        None => Err(anyhow!("no post named `{}`", name)),
    }
}
