#[macro_use]
extern crate clap;
#[macro_use]
extern crate slog;
extern crate pagerank;

use std::process;
use std::time::Duration;

use clap::Arg;

use pagerank::config::{self, JobSettings, RankConfig, Retention};
use pagerank::node::score_line;
use pagerank::rank_state::new_logger;
use pagerank::scaled::DEFAULT_SCALE;

const SHOWN_ON_EXIT: usize = 10;

fn argv<'a>() -> clap::ArgMatches<'a> {
    clap::App::new(crate_name!()).about(crate_description!())
        .author(crate_authors!()).version(crate_version!())

        .arg(Arg::with_name("INPUT")
             .required(true)
             .help("Edge list, one `<source> <destination>` pair per line"))
        .arg(Arg::with_name("OUTPUT")
             .required(true)
             .help("Directory for round state, scores and reports"))
        .arg(Arg::with_name("MAX_ITER")
             .help("Maximum number of rounds [default: 10]"))
        .arg(Arg::with_name("DAMPING")
             .help("Damping factor in [0, 1] [default: 0.85]"))
        .arg(Arg::with_name("THRESHOLD")
             .help("Convergence threshold on the mean rank change [default: 1e-6]"))
        .arg(Arg::with_name("MIN_ITER")
             .help("Rounds that must run before convergence counts [default: 5]"))

        .arg(Arg::with_name("top_k")
             .long("top-k")
             .takes_value(true)
             .help("Number of nodes written to top_<k>.txt [default: 50]"))
        .arg(Arg::with_name("threads")
             .long("threads")
             .takes_value(true)
             .help("Worker threads and shuffle partitions [default: CPU count]"))
        .arg(Arg::with_name("precision")
             .long("precision")
             .takes_value(true)
             .help("Decimal places in written ranks [default: 12]"))
        .arg(Arg::with_name("comment")
             .long("comment")
             .takes_value(true)
             .help("Lines starting with this marker are skipped [default: #]"))
        .arg(Arg::with_name("retain")
             .long("retain")
             .takes_value(true)
             .possible_values(&["final", "previous", "all"])
             .help("Which round files survive the run [default: final]"))
        .arg(Arg::with_name("memory")
             .long("memory")
             .help("Keep round state in memory instead of the output directory"))
        .arg(Arg::with_name("time_budget")
             .long("time-budget")
             .takes_value(true)
             .help("Seconds after which no new round is started"))
        .arg(Arg::with_name("scale")
             .long("scale")
             .takes_value(true)
             .help("Fixed-point scale of the round accumulators [default: 1e12]"))
        .get_matches()
}

fn opt<T: ::std::str::FromStr>(args: &clap::ArgMatches, name: &str, default: T) -> T {
    if args.is_present(name) {
        value_t!(args, name, T).unwrap_or_else(|e| e.exit())
    } else {
        default
    }
}

fn main() {
    let args = argv();
    let log = new_logger();

    let rank_config = RankConfig {
        max_iterations: opt(&args, "MAX_ITER", config::DEFAULT_MAX_ITER),
        damping: opt(&args, "DAMPING", config::DEFAULT_DAMPING),
        threshold: opt(&args, "THRESHOLD", config::DEFAULT_THRESHOLD),
        min_iterations: opt(&args, "MIN_ITER", config::DEFAULT_MIN_ITER),
        scale: opt(&args, "scale", DEFAULT_SCALE as f64) as i64,
        time_budget: if args.is_present("time_budget") {
            Some(Duration::from_secs_f64(opt(&args, "time_budget", 0f64).max(0.0).min(1e12)))
        } else {
            None
        },
    };

    let mut settings = JobSettings::new(args.value_of("INPUT").unwrap_or_default(),
                                        args.value_of("OUTPUT").unwrap_or_default());
    settings.top_k = opt(&args, "top_k", config::DEFAULT_TOP_K);
    settings.threads = opt(&args, "threads", settings.threads);
    settings.precision = opt(&args, "precision", config::DEFAULT_PRECISION);
    settings.retention = opt(&args, "retain", Retention::Final);
    settings.in_memory = args.is_present("memory");
    if let Some(c) = args.value_of("comment") {
        settings.comment_marker = c.to_string();
    }

    info!(log, "Ranking `{}`", settings.input.display();
          "max_iter" => rank_config.max_iterations,
          "min_iter" => rank_config.min_iterations,
          "damping" => rank_config.damping,
          "threshold" => rank_config.threshold,
          "threads" => settings.threads);

    match pagerank::run(&settings, &rank_config, &log) {
        Ok(summary) => {
            println!("{} nodes, {} rounds, converged: {}, avg diff {:.3e}",
                     summary.nodes, summary.rounds, summary.converged, summary.avg_diff);
            if !summary.quality.is_clean() {
                println!("Data quality: {}", summary.quality);
            }
            for s in summary.top.iter().take(SHOWN_ON_EXIT) {
                println!("{}", score_line(&s.id, s.rank, settings.precision));
            }
        }
        Err(e) => {
            crit!(log, "{}", e);
            eprintln!("error: {}", e);
            process::exit(e.exit_code());
        }
    }
}
