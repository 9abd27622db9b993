mod config;
mod error;
mod packet;
mod ping;
mod socket;
mod stats;
mod util;

use std::net::Ipv4Addr;
use std::process;
use std::time::Duration;

use colored::*;

use clap::{App, AppSettings, Arg, ArgMatches};

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use config::PingConfig;
use ping::{Attempt, Outcome, Pinger};
use stats::{as_millis_f64, Summary};

const EXIT_FATAL: i32 = 1;
const EXIT_USAGE: i32 = 2;

fn main() {
    let matches = App::new("echoprobe")
        .setting(AppSettings::ColoredHelp)
        .version("v0.1")
        .author("Bryan Becar <becar.bryan@gmail.com>")
        .about("Sends ICMP Echo Requests to an IPv4 address and reports round trip times.\nNeeds raw socket privileges (run with sudo).")
        .arg(Arg::with_name("DESTINATION")
            .help("IPv4 address in dotted-quad form")
            .required(true)
            .index(1))
        .arg(Arg::with_name("timeout")
            .help("Set how long to wait for each reply before giving up (Default 5s)")
            .short("W")
            .takes_value(true))
        .arg(Arg::with_name("interval")
            .help("Set how long to wait in between requests (Default 1s)")
            .short("i")
            .takes_value(true))
        .arg(Arg::with_name("count")
            .help("Stop after this many requests (Default 5)")
            .short("c")
            .takes_value(true))
        .arg(Arg::with_name("ttl")
            .help("Set ttl on outgoing packets")
            .short("t")
            .takes_value(true))
        .arg(Arg::with_name("verbose")
            .help("Log to stderr, repeat for more detail")
            .short("v")
            .multiple(true))
        .get_matches();

    init_logging(matches.occurrences_of("verbose"));

    let destination_arg = matches.value_of("DESTINATION").unwrap_or_default();
    let destination = match util::parse_destination(destination_arg) {
        Ok(d) => d,
        Err(e) => usage_error(&format!("Invalid destination: {}", e)),
    };
    let config = match config_from(&matches) {
        Ok(c) => c,
        Err(e) => usage_error(&e),
    };

    let pinger = match Pinger::new(destination, config) {
        Ok(p) => p,
        Err(e) => fatal(&e),
    };

    println!("{} ({}): {} bytes of data.",
        "PING".cyan(), destination.to_string().bold(), packet::ECHO_MESSAGE_LEN);

    let summary = match pinger.run(report) {
        Ok(s) => s,
        Err(e) => fatal(&e),
    };
    tracing::debug!(stop = ?summary.stop, "run summary");

    println!(); // New line
    for line in format_summary(pinger.destination(), &summary) {
        println!("{}", line);
    }
}

fn init_logging(verbosity: u64) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Error setting up logging: {}", e);
    }
}

fn config_from(matches: &ArgMatches<'_>) -> Result<PingConfig, String> {
    let mut config = PingConfig::default();

    if let Some(timeout) = matches.value_of("timeout") {
        config.timeout = parse_duration(timeout, "timeout")?;
        if config.timeout == Duration::from_secs(0) {
            return Err("Timeout must be greater than zero".to_string());
        }
    }
    if let Some(interval) = matches.value_of("interval") {
        config.interval = parse_duration(interval, "interval")?;
    }
    if let Some(count) = matches.value_of("count") {
        config.count = match count.parse::<u32>() {
            Ok(c) if c > 0 => c,
            _ => return Err(format!("Invalid count: {} (ex: 5)", count)),
        };
    }
    if let Some(ttl) = matches.value_of("ttl") {
        config.ttl = Some(ttl.parse::<u32>()
            .map_err(|_| format!("Invalid ttl: {} (ex: 64)", ttl))?);
    }

    Ok(config)
}

fn parse_duration(value: &str, what: &str) -> Result<Duration, String> {
    humantime::parse_duration(value)
        .map_err(|e| format!("Invalid duration for {}: {} ({}) (ex: 1s, 400ms, 1m)", what, value, e))
}

fn report(attempt: &Attempt) {
    if let Outcome::IcmpError { message_type, code, .. } = &attempt.outcome {
        tracing::info!(message_type = *message_type, code = *code, "icmp error reply");
    }
    println!("{}", format_attempt(attempt));
}

fn format_attempt(attempt: &Attempt) -> String {
    match &attempt.outcome {
        Outcome::Reply(pong) => format!("{} bytes from {}: icmp_seq={} ttl={} time={} ms",
            pong.size, pong.source.to_string().yellow(), pong.sequence.to_string().bold(),
            pong.ttl.to_string().bold(), format!("{:.3}", as_millis_f64(pong.rtt)).bold()),

        Outcome::TimedOut => format!("icmp_seq={} {}", attempt.sequence, "Timeout Expired...".yellow()),

        Outcome::NotProcessed => format!("icmp_seq={} {}", attempt.sequence, "ICMP Datagram Not Processed...".yellow()),

        Outcome::IcmpError { source, description, .. } => format!("From {}: icmp_seq={} {}",
            source, attempt.sequence, description.red()),
    }
}

fn format_summary(destination: Ipv4Addr, summary: &Summary) -> Vec<String> {
    let mut lines = vec![format!("{} {} {} {}",
        "---".yellow(), destination.to_string().bold(), "ping statistics".cyan(), "---".yellow())];

    lines.push(format!("{} packet/s transmitted, {} received, {} packet loss, time {:.3} ms",
        summary.transmitted.to_string().bold(), summary.received().to_string().bold(),
        summary.lost().to_string().bold(), as_millis_f64(summary.rtt.total())));

    if let (Some(min), Some(avg), Some(max)) = (summary.rtt.min(), summary.rtt.avg(), summary.rtt.max()) {
        lines.push(format!("rtt min/avg/max = {:.3}/{:.3}/{:.3} ms",
            as_millis_f64(min), as_millis_f64(avg), as_millis_f64(max)));
    }
    lines
}

fn usage_error(message: &str) -> ! {
    eprintln!("{}", message.red());
    eprintln!("Usage: sudo echoprobe <IPv4 Address>");
    process::exit(EXIT_USAGE);
}

fn fatal(error: &error::ProbeError) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), error);
    process::exit(EXIT_FATAL);
}
