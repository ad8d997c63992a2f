//! Airspy CLI - Wireless reconnaissance and audit
//!
//! A command-line tool for scanning Wi-Fi, Bluetooth and sub-GHz radio,
//! running deauthentication and handshake attacks, and writing audit reports.

mod commands;
mod terminal;
mod tui;

use std::path::PathBuf;

use airspy_core::domain::OutputFormat;
use airspy_core::{ChannelRange, WifiFilter};
use clap::{CommandFactory, Parser, Subcommand};

use commands::Context;

#[derive(Parser)]
#[command(name = "airspy")]
#[command(author, version, about = "Wireless reconnaissance: Wi-Fi, Bluetooth, sub-GHz radio")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Configuration file (default: ~/.airspy/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Monitor-mode wireless interface
    #[arg(short, long, global = true)]
    interface: Option<String>,

    /// Run capture tools without sudo
    #[arg(long, global = true)]
    no_sudo: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable interactive TUI mode
    #[arg(long, global = true)]
    no_tui: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan Wi-Fi networks and their clients
    #[command(alias = "w")]
    Wifi {
        /// Scan duration in seconds
        #[arg(short = 'T', long, default_value_t = 10)]
        timeout: u64,

        /// Keep only this SSID
        #[arg(long)]
        filter_ssid: Option<String>,

        /// Keep only these channels (e.g. 6 or 1-6)
        #[arg(long)]
        filter_channel: Option<ChannelRange>,

        /// Minimum signal strength in dBm (e.g. -50)
        #[arg(long, allow_hyphen_values = true)]
        min_signal: Option<i32>,

        /// Analyze channel usage and recommend the least crowded one
        #[arg(long)]
        channels: bool,

        /// Skip MAC vendor lookups
        #[arg(long)]
        no_vendor: bool,
    },

    /// Scan Bluetooth Low Energy devices
    #[command(alias = "bt")]
    Bluetooth {
        /// Scan duration in seconds
        #[arg(short = 'T', long, default_value_t = 10)]
        timeout: u64,

        /// Skip MAC vendor lookups
        #[arg(long)]
        no_vendor: bool,
    },

    /// Decode sub-GHz transmissions with rtl_433
    #[command(alias = "rf")]
    Radio {
        /// Frequency (default from config, 433.92M)
        #[arg(short, long)]
        frequency: Option<String>,

        /// Scan duration in seconds
        #[arg(short = 'T', long, default_value_t = 10)]
        timeout: u64,

        /// Stream events until Ctrl-C
        #[arg(long)]
        live: bool,

        /// Tuner gain (e.g. auto, 40)
        #[arg(long)]
        gain: Option<String>,

        /// Decode only this protocol (e.g. 40 for Acurite)
        #[arg(long)]
        protocol: Option<String>,

        /// Decoder output format: json, csv, log, mqtt, influx
        #[arg(long, default_value = "json")]
        output: OutputFormat,

        /// SDR device backend (default from config, soapy)
        #[arg(long)]
        device: Option<String>,
    },

    /// Deauthenticate clients from an access point
    Deauth {
        /// Access point MAC address
        #[arg(short = 'a', long)]
        bssid: String,

        /// Client MAC address (all clients when omitted)
        #[arg(short = 'c', long)]
        station: Option<String>,

        /// Attack duration in seconds
        #[arg(short = 'T', long, default_value_t = 10)]
        timeout: u64,
    },

    /// Capture a WPA handshake from one network
    #[command(alias = "hs")]
    Handshake {
        /// Access point MAC address
        #[arg(short = 'a', long)]
        bssid: String,

        /// Channel the access point is on
        #[arg(short, long, allow_hyphen_values = true)]
        channel: i32,

        /// Network name, used for the saved file name
        #[arg(short, long, default_value = "")]
        essid: String,

        /// Capture duration in seconds (default from config, 30)
        #[arg(short = 'T', long)]
        timeout: Option<u64>,

        /// Directory for saved handshakes (default: captured_handshake)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Recover a WPA key from a capture with a wordlist
    Crack {
        /// Capture file (.cap)
        capture: PathBuf,

        /// Wordlist file
        #[arg(short, long)]
        wordlist: PathBuf,

        /// Network to attack when the capture holds several
        #[arg(short = 'a', long)]
        bssid: Option<String>,
    },

    /// Run a full audit: Wi-Fi, Bluetooth, RF at 433.92M and 868M
    Audit {
        /// Report file (default from config, audit.txt)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Scan periodically until stopped
    Monitor,

    /// Check which external tools are installed
    Tools,

    /// Show current configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default configuration file
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

fn interactive(cli: &Cli) -> bool {
    !cli.no_tui && !cli.json && atty::is(atty::Stream::Stdout)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The TUI owns the terminal, so nothing may log to it.
    let wants_tui = interactive(&cli) && matches!(cli.command, None | Some(Commands::Monitor));
    if !wants_tui {
        terminal::logging::init(cli.verbose);
    }

    match cli.command {
        Some(Commands::Tools) => return commands::tools::run(cli.json),
        Some(Commands::Config { ref action }) => {
            let path = cli.config.clone();
            return match action {
                None => commands::config::show(path, cli.json).await,
                Some(ConfigAction::Init { force }) => commands::config::init(path, *force).await,
            };
        }
        None if !wants_tui => {
            Cli::command().print_help()?;
            return Ok(());
        }
        _ => {}
    }

    let ctx = Context::load(cli.config, cli.interface, cli.no_sudo, cli.json).await?;
    let privileged = matches!(
        cli.command,
        None | Some(Commands::Wifi { .. })
            | Some(Commands::Deauth { .. })
            | Some(Commands::Handshake { .. })
            | Some(Commands::Crack { .. })
            | Some(Commands::Audit { .. })
            | Some(Commands::Monitor)
    );
    if privileged {
        ctx.authorize_sudo().await;
    }

    match cli.command {
        Some(Commands::Wifi {
            timeout,
            filter_ssid,
            filter_channel,
            min_signal,
            channels,
            no_vendor,
        }) => {
            let args = commands::wifi::WifiArgs {
                duration: timeout,
                filter: WifiFilter {
                    ssid: filter_ssid,
                    channels: filter_channel,
                    min_signal,
                },
                analyze_channels: channels,
                vendors: !no_vendor,
            };
            commands::wifi::run(&ctx, args).await?;
        }
        Some(Commands::Bluetooth { timeout, no_vendor }) => {
            commands::bluetooth::run(&ctx, timeout, !no_vendor).await?;
        }
        Some(Commands::Radio {
            frequency,
            timeout,
            live,
            gain,
            protocol,
            output,
            device,
        }) => {
            let args = commands::radio::RadioArgs {
                frequency,
                duration: timeout,
                live,
                gain,
                protocol,
                format: output,
                device,
            };
            commands::radio::run(&ctx, args).await?;
        }
        Some(Commands::Deauth {
            bssid,
            station,
            timeout,
        }) => {
            commands::deauth::run(&ctx, bssid, station, timeout).await?;
        }
        Some(Commands::Handshake {
            bssid,
            channel,
            essid,
            timeout,
            output,
        }) => {
            let args = commands::handshake::HandshakeArgs {
                bssid,
                channel,
                essid,
                duration: timeout,
                output_dir: output,
            };
            commands::handshake::run(&ctx, args).await?;
        }
        Some(Commands::Crack {
            capture,
            wordlist,
            bssid,
        }) => {
            commands::crack::run(&ctx, capture, wordlist, bssid).await?;
        }
        Some(Commands::Audit { output }) => {
            commands::audit::run(&ctx, output).await?;
        }
        Some(Commands::Monitor) | None => {
            if wants_tui {
                tui::run(&ctx).await?;
            } else {
                commands::monitor::run(&ctx).await?;
            }
        }
        Some(Commands::Tools) | Some(Commands::Config { .. }) => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_wifi_filters() {
        let cli = Cli::try_parse_from([
            "airspy",
            "wifi",
            "--filter-channel",
            "1-6",
            "--min-signal",
            "-50",
            "-i",
            "wlan1mon",
        ])
        .unwrap();
        assert_eq!(cli.interface.as_deref(), Some("wlan1mon"));
        match cli.command {
            Some(Commands::Wifi {
                filter_channel,
                min_signal,
                ..
            }) => {
                assert_eq!(filter_channel.unwrap().to_string(), "1-6");
                assert_eq!(min_signal, Some(-50));
            }
            _ => panic!("expected wifi command"),
        }
    }

    #[test]
    fn test_deauth_requires_bssid() {
        assert!(Cli::try_parse_from(["airspy", "deauth"]).is_err());
        assert!(Cli::try_parse_from(["airspy", "deauth", "-a", "AA:BB:CC:DD:EE:FF"]).is_ok());
    }

    #[test]
    fn test_radio_output_format() {
        let cli = Cli::try_parse_from(["airspy", "radio", "--output", "csv", "-f", "868M"]).unwrap();
        match cli.command {
            Some(Commands::Radio { output, frequency, .. }) => {
                assert_eq!(output, OutputFormat::Csv);
                assert_eq!(frequency.as_deref(), Some("868M"));
            }
            _ => panic!("expected radio command"),
        }
        assert!(Cli::try_parse_from(["airspy", "radio", "--output", "xml"]).is_err());
    }
}
