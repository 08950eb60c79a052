use std::env;
use std::path::PathBuf;

pub struct CliOptions {
    pub scenario: Option<PathBuf>,
    pub preset: Option<String>,
    pub seed: Option<u64>,
    pub year: Option<i32>,
    pub production: Option<PathBuf>,
    pub consumption: Option<PathBuf>,
    pub weather: Option<PathBuf>,
    pub out: Option<PathBuf>,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    if args.len() == 1 && (args[0] == "--help" || args[0] == "-h") {
        print_usage();
        std::process::exit(0);
    }
    parse_options(&args)
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut opts = CliOptions {
        scenario: None,
        preset: None,
        seed: None,
        year: None,
        production: None,
        consumption: None,
        weather: None,
        out: None,
    };

    fn set_path(
        slot: &mut Option<PathBuf>,
        args: &[String],
        i: &mut usize,
        flag: &str,
    ) -> Result<(), String> {
        *i += 1;
        let path = args
            .get(*i)
            .ok_or_else(|| format!("missing value for {flag} (expected a file path)"))?;
        if slot.replace(PathBuf::from(path)).is_some() {
            return Err(format!("{flag} provided more than once"));
        }
        Ok(())
    }

    while i < args.len() {
        match args[i].as_str() {
            "--scenario" => set_path(&mut opts.scenario, args, &mut i, "--scenario")?,
            "--production" => set_path(&mut opts.production, args, &mut i, "--production")?,
            "--consumption" => set_path(&mut opts.consumption, args, &mut i, "--consumption")?,
            "--weather" => set_path(&mut opts.weather, args, &mut i, "--weather")?,
            "--out" => set_path(&mut opts.out, args, &mut i, "--out")?,
            "--preset" => {
                i += 1;
                let name = args.get(i).ok_or_else(|| {
                    "missing value for --preset (expected a preset name)".to_string()
                })?;
                if opts.preset.replace(name.clone()).is_some() {
                    return Err("--preset provided more than once".to_string());
                }
            }
            "--seed" => {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or_else(|| "missing value for --seed (expected a u64)".to_string())?;
                let seed = value
                    .parse::<u64>()
                    .map_err(|_| format!("--seed value \"{value}\" is not a valid u64"))?;
                if opts.seed.replace(seed).is_some() {
                    return Err("--seed provided more than once".to_string());
                }
            }
            "--year" => {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or_else(|| "missing value for --year (expected a year)".to_string())?;
                let year = value
                    .parse::<i32>()
                    .map_err(|_| format!("--year value \"{value}\" is not a valid year"))?;
                if opts.year.replace(year).is_some() {
                    return Err("--year provided more than once".to_string());
                }
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if opts.scenario.is_some() && opts.preset.is_some() {
        return Err(
            "arguments `--scenario` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }

    Ok(opts)
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  rebal-sim [--scenario <path> | --preset <name>] [--year <y>] [--seed <u64>]"
    );
    eprintln!(
        "            [--production <csv>] [--consumption <csv>] [--weather <csv>] [--out <csv>]"
    );
    eprintln!();
    eprintln!("Input series not supplied as CSV are synthesized from the seed.");
    eprintln!("Without --scenario or --preset the baseline preset is used.");
}
