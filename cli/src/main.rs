use clap::Parser;
use colored::*;
use std::io::Write;
use std::process;
use std::sync::Arc;
use url::Url;

use xssfang_core::{
    discover_injection_points, print_summary, ConsoleSink, HttpClient, PayloadLoader, Reporter,
    ScanConfig, ScanEngine, ScanMode, ScanReport,
};

#[derive(Parser, Debug)]
#[command(
    name = "XSSFANG",
    version,
    about = "Aggressive reflected/DOM XSS scanner with filter evasion",
    override_usage = "xssfang <target>  <options>",
    after_help = "\x1b[1;36mEXAMPLES:\x1b[0m
  Quick scan:                 xssfang 'http://target.com/?search=test'
  Stealth mode:               xssfang http://target.com --stealth
  Full evasion:               xssfang http://target.com --stealth --aggressive-waf --geo-spoof
  Blind payload list:         xssfang http://target.com -m blind
  With proxy (Burp):          xssfang http://target.com --proxy http://127.0.0.1:8080
  Quick test run:             xssfang http://target.com --max-payloads 20 -v
  Custom payload file:        xssfang http://target.com -p my_payloads.txt"
)]
pub struct Args {
    /// Target URL with potential injection points
    pub target: String,

    #[arg(short = 'm', long, default_value = "reflected",
        value_parser = clap::builder::PossibleValuesParser::new(["reflected", "blind"]),
        help = "Scan mode: reflected or blind payload list")]
    pub mode: String,

    #[arg(long, default_value_t = 15, help = "Request timeout in seconds")]
    pub timeout: u64,

    #[arg(long, default_value_t = 0.5, help = "Delay between requests in seconds")]
    pub delay: f64,

    #[arg(long, help = "Proxy URL (e.g. http://127.0.0.1:8080)")]
    pub proxy: Option<String>,

    #[arg(long, default_value = "scan_results", help = "Directory to save JSON/HTML results")]
    pub results_dir: String,

    #[arg(short = 'p', long, help = "Payload file overriding the mode's default list")]
    pub payloads: Option<String>,

    #[arg(long, default_value_t = 0, help = "Limit number of payloads loaded (0 = all)")]
    pub max_payloads: usize,

    #[arg(long, default_value_t = false, help = "Stealth mode: random 1-3s delays between requests")]
    pub stealth: bool,

    #[arg(long, default_value_t = false, help = "Aggressive WAF evasion: randomize headers per-request")]
    pub aggressive_waf: bool,

    #[arg(long, default_value_t = false, help = "Geo-spoofing headers to bypass geo-blocking")]
    pub geo_spoof: bool,

    #[arg(short = 'v', long, default_value_t = false, help = "Verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Simulate scan without sending real requests")]
    pub dry_run: bool,
}

#[tokio::main]
async fn main() {
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default()
            .default_filter_or(if args.verbose { "debug" } else { "warn" }),
    )
    .init();

    print_banner();

    if let Err(e) = Url::parse(&args.target) {
        eprint!("{}\r\n", format!("[!] Invalid target URL '{}': {}", args.target, e).red());
        process::exit(1);
    }

    if args.dry_run {
        println!("[DRY RUN] Would scan target: {}", args.target);
        return;
    }

    print_disclaimer();
    print_scan_config(&args);

    let config = ScanConfig {
        target: args.target.clone(),
        mode: ScanMode::parse(&args.mode).unwrap_or_default(),
        timeout: args.timeout,
        delay: args.delay,
        proxy: args.proxy.clone().unwrap_or_default(),
        results_dir: args.results_dir.clone(),
        payload_file: args.payloads.clone().unwrap_or_default(),
        max_payloads: args.max_payloads,
        stealth: args.stealth,
        aggressive_waf: args.aggressive_waf,
        geo_spoof: args.geo_spoof,
        verbose: args.verbose,
    };

    let client = match HttpClient::new(config.timeout, config.proxy_ref()) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprint!("{}\r\n", format!("[!] Failed to set up HTTP session: {}", e).red());
            process::exit(1);
        }
    };

    let loader = PayloadLoader::load(config.mode, config.payload_file_ref(), config.max_payloads);
    print!(
        "{}\r\n",
        format!("[+] Payloads ready: {}", loader.payload_count()).green()
    );
    std::io::stdout().flush().ok();

    let sink = ConsoleSink::new_ref();

    let points =
        discover_injection_points(&config.target, &client, config.geo_spoof, &sink).await;
    if points.is_empty() {
        print!("\r\n{}\r\n", "[-] No injection points discovered.".yellow());
        print_troubleshooting(&args.target);
        return;
    }

    let engine = ScanEngine::new(
        Arc::clone(&client),
        loader.into_payloads(),
        config.clone(),
        Arc::clone(&sink),
    );
    let results = engine.run(&points).await;

    print!("\r\n{}\r\n", "═".repeat(60).dimmed());
    print_summary(&results, &sink);

    if !results.is_empty() {
        let report = ScanReport::generate(&config, results);
        let reporter = Reporter::new(&config.results_dir);
        match reporter.save(&report) {
            Ok(Some((json_path, html_path))) => {
                print!("\r\n{}\r\n", "[+] Results saved:".green().bold());
                print!("    JSON: {}\r\n", json_path.display());
                print!("    HTML: {}\r\n", html_path.display());
                std::io::stdout().flush().ok();
            }
            Ok(None) => {}
            Err(e) => {
                eprint!("{}\r\n", format!("[!] Failed to save results: {}", e).red());
            }
        }
    } else {
        print!(
            "{}\r\n",
            "[*] Scan completed. No results file generated (no vulnerabilities found).".dimmed()
        );
        std::io::stdout().flush().ok();
    }
}

/// Prints the XSSFANG ASCII banner.
fn print_banner() {
    let banner = r#"
   ██╗  ██╗███████╗███████╗███████╗ █████╗ ███╗   ██╗ ██████╗
   ╚██╗██╔╝██╔════╝██╔════╝██╔════╝██╔══██╗████╗  ██║██╔════╝
    ╚███╔╝ ███████╗███████╗█████╗  ███████║██╔██╗ ██║██║  ███╗
    ██╔██╗ ╚════██║╚════██║██╔══╝  ██╔══██║██║╚██╗██║██║   ██║
   ██╔╝ ██╗███████║███████║██║     ██║  ██║██║ ╚████║╚██████╔╝
   ╚═╝  ╚═╝╚══════╝╚══════╝╚═╝     ╚═╝  ╚═╝╚═╝  ╚═══╝ ╚═════╝
    "#;
    print!("{}\r\n", banner.bright_cyan().bold());
    print!("{}\r\n", "──────────────────────────────────────────────────".dimmed());
    std::io::stdout().flush().ok();
}

fn print_disclaimer() {
    print!("\r\n{}\r\n", "═".repeat(60).dimmed());
    print!("{}\r\n", "LEGAL DISCLAIMER".bold());
    print!(
        "{}\r\n",
        "Only scan sites you own or have EXPLICIT written permission to test.".yellow()
    );
    print!(
        "{}\r\n",
        "Unauthorized testing may violate laws including the CFAA.".yellow()
    );
    print!("{}\r\n", "═".repeat(60).dimmed());
    std::io::stdout().flush().ok();
}

/// Prints the scan configuration summary for the target.
fn print_scan_config(args: &Args) {
    print!("{}\r\n", format!("[+] Target:      {}", args.target).green().bold());
    print!("{}\r\n", format!("[+] Mode:        {}", args.mode).magenta().bold());
    print!("{}\r\n", format!("[+] Timeout:     {}s", args.timeout).blue());
    print!("{}\r\n", format!("[+] Delay:       {}s", args.delay).blue());
    print!("{}\r\n", format!("[+] Results dir: {}", args.results_dir).blue());
    if let Some(ref proxy) = args.proxy {
        print!("{}\r\n", format!("[+] Proxy:       {}", proxy).yellow());
    }
    if args.max_payloads > 0 {
        print!("{}\r\n", format!("[+] Max payloads: {}", args.max_payloads).blue());
    }
    if args.stealth {
        print!("{}\r\n", "[*] Stealth mode: random delays + randomized headers".yellow());
    }
    if args.aggressive_waf {
        print!(
            "{}\r\n",
            "[*] Aggressive WAF evasion: per-request header randomization + adaptive delays".yellow()
        );
    }
    if args.geo_spoof {
        print!("{}\r\n", "[*] Geo-spoofing: enabled (bypassing geo-blocking)".yellow());
    }
    print!("{}\r\n", "──────────────────────────────────────────────────".dimmed());
    std::io::stdout().flush().ok();
}

fn print_troubleshooting(target: &str) {
    let tips = [
        "    1. Site may be a Single Page App (SPA) - no traditional forms/params",
        "    2. Site may require authentication or specific headers",
        "    3. Try with --stealth to bypass bot detection",
        "    4. Try with --aggressive-waf for maximum WAF evasion",
        "    5. Try with --geo-spoof to bypass geo-blocking",
        "    6. Try with --proxy to route through Burp Suite for manual inspection",
        "    7. Use a direct URL with parameters: ?search=test&id=123",
    ];
    print!("\r\n{}\r\n", "[!] TROUBLESHOOTING TIPS:".yellow().bold());
    for tip in tips {
        print!("{}\r\n", tip);
    }
    print!("\r\n{}\r\n", "[!] Example with full evasion:".yellow());
    print!(
        "    xssfang '{}?search=test' --stealth --aggressive-waf --geo-spoof -v\r\n",
        target
    );
    std::io::stdout().flush().ok();
}
