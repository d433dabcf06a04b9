// sudo apt-get install libssl-dev
extern crate chrono;
extern crate chrono_tz;
extern crate flexi_logger;
extern crate getopts;
#[macro_use]
extern crate log;
extern crate reqwest;
#[macro_use]
extern crate serde_derive;
extern crate tokio;

mod config;
mod display;
mod feed;
mod follow;
mod poll;
mod result;
mod routes;
mod session;
mod stops;
mod timecode;
mod tracker;

const COMMAND_HELP: &str = "Commands: r (refresh now), l (list routes), f ROUTE (follow/unfollow), F R1,R2 (follow only these), q (close)";

fn setup_logging(log_dir: Option<String>) -> result::TTWatchResult<flexi_logger::LoggerHandle> {
    let logger = flexi_logger::Logger::try_with_env_or_str("info")?
        .format(flexi_logger::detailed_format);

    let logger = match log_dir {
        Some(dir) => logger
            .log_to_file(flexi_logger::FileSpec::default().directory(dir))
            .duplicate_to_stderr(flexi_logger::Duplicate::Warn),
        None => logger,
    };

    return Ok(logger.start()?);
}

fn print_stop_items(items: &[stops::StopItem]) {
    for item in items {
        match item.distance_m {
            Some(distance) => println!("{:>8}  {} ({} m)", item.id, item.title, distance),
            None => println!("{:>8}  {}", item.id, item.title),
        }
        if !item.subtitle.is_empty() {
            println!("          {}", item.subtitle);
        }
    }
}

async fn read_commands(tx: tokio::sync::mpsc::Sender<poll::Command>) {
    use tokio::io::AsyncBufReadExt;

    println!("{}", COMMAND_HELP);
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                match poll::parse_command(&line) {
                    Some(command) => {
                        let close = command == poll::Command::Close;
                        if tx.send(command).await.is_err() || close {
                            return;
                        }
                    },
                    None => println!("{}", COMMAND_HELP),
                }
            },
            Ok(None) => {
                debug!("stdin closed");
                return;
            },
            Err(err) => {
                warn!("Error reading commands: {}", err);
                return;
            },
        }
    }
}

async fn watch(config: &config::Config, stop_id: &str, refresh: bool, follow: Vec<String>) -> result::TTWatchResult<()> {
    let mut session = session::ScheduleViewSession::new(
        stop_id, session::PollSettings::from_config(config));
    if !follow.is_empty() {
        session.select_following(follow);
    }

    let mut view = display::ConsoleView::new(
        std::io::stdout(), config.tz()?, config.notification_fade_timeout);
    let fetcher = feed::HttpFetcher::new();

    let (tx, mut rx) = tokio::sync::mpsc::channel(16);
    if refresh {
        tokio::spawn(read_commands(tx));
    } else {
        drop(tx);
    }

    poll::run_session(&mut session, refresh, &fetcher, &mut view, &mut rx).await;
    return Ok(());
}

fn run(matches: &getopts::Matches) -> result::TTWatchResult<()> {
    let config = config::from_file(
        matches.opt_str("config").unwrap_or("config.json".to_string()))?;

    if matches.opt_present("favourites") {
        print_stop_items(&stops::favourites(&config));
        return Ok(());
    }

    if let Some(position) = matches.opt_str("nearest") {
        let (lat, lon) = stops::parse_position(&position)?;
        let all_stops = stops::stop_info_from_file(&config.stop_info)?;
        let items = stops::nearest(&all_stops, lat, lon, config.max_distance);
        if items.is_empty() {
            println!("No stops within {} m", config.max_distance);
        }
        print_stop_items(&items);
        return Ok(());
    }

    let stop_id = matches.opt_str("stop").ok_or(
        result::make_error("No stop given, pick one with --favourites or --nearest"))?;
    let one_shot = matches.opt_present("one-shot");
    let follow: Vec<String> = matches.opt_str("follow")
        .map(|f| f.split(",").map(|s| s.to_string()).collect())
        .unwrap_or(vec![]);

    info!("Running. stop={} one-shot={} follow={:?}", stop_id, one_shot, follow);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    return runtime.block_on(watch(&config, &stop_id, !one_shot, follow));
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let mut opts = getopts::Options::new();
    opts.optopt("c", "config", "Config file (default config.json)", "FILE");
    opts.optopt("s", "stop", "Stop to watch", "STOP_ID");
    opts.optflag("o", "one-shot", "Fetch once instead of keeping the schedule up to date");
    opts.optopt("f", "follow", "Routes to alert on", "ROUTE,ROUTE");
    opts.optflag("", "favourites", "List favourite stops");
    opts.optopt("", "nearest", "List stops near a position", "LAT,LON");
    opts.optopt("", "log-dir", "Write logs to files in this directory", "DIR");
    opts.optflag("h", "help", "Show this help");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(err) => {
            eprintln!("{}\n{}", err, opts.usage("Usage: ttwatch [options]"));
            std::process::exit(2);
        },
    };

    if matches.opt_present("help") {
        print!("{}", opts.usage("Usage: ttwatch [options]"));
        return;
    }

    let _logger = match setup_logging(matches.opt_str("log-dir")) {
        Ok(handle) => handle,
        Err(err) => {
            eprintln!("Could not set up logging: {}", err);
            std::process::exit(1);
        },
    };

    if let Err(err) = run(&matches) {
        error!("{:?}", err);
        std::process::exit(1);
    }
}
