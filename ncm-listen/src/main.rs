use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use netease_eapi::types::{DEFAULT_BITRATE, RadioSong};
use netease_eapi::{
    EapiClient, PlayLog, PlayRecord, PlaySource, Session, signed_in_user_id, user_profile,
};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod scheduler;

use config::Settings;
use scheduler::{Scheduler, Task};

const FLUSH_INTERVAL: Duration = Duration::from_secs(600);
const RADIO_RETRY: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(
    name = "ncm-listen",
    version,
    about = "Plays the Netease personal radio unattended and reports playback logs"
)]
struct Cli {
    /// Directory holding `cookies.json` and `config.toml`
    #[arg(long, global = true, value_name = "PATH")]
    data_dir: Option<PathBuf>,
    /// Debug logging (overridden by `RUST_LOG`)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Listen to the personal radio and upload playback logs every 10 minutes
    Run {
        /// Account name (email login)
        #[arg(short, long, requires = "password")]
        username: Option<String>,
        /// Account password
        #[arg(short, long, requires = "username")]
        password: Option<String>,
        /// Log in with a `MUSIC_U` cookie value instead
        #[arg(long, value_name = "MUSIC_U")]
        cookie: Option<String>,
        /// Seconds to play each song (at most a day), 0 plays whole songs
        #[arg(
            short = 't',
            long,
            default_value = "0",
            value_parser = clap::value_parser!(u64).range(0..=86_400)
        )]
        play_time: u64,
    },
    /// Show the signed-in user
    Me,
    /// Extend the lifetime of the saved `MUSIC_U` token
    Refresh,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => dirs::config_dir()
            .context("cannot determine config directory")?
            .join("ncm-listen"),
    };

    match cli.command {
        Command::Run {
            username,
            password,
            cookie,
            play_time,
        } => cmd_run(&data_dir, username, password, cookie, play_time),
        Command::Me => cmd_me(&data_dir),
        Command::Refresh => cmd_refresh(&data_dir),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "ncm_listen=debug,netease_eapi=debug"
    } else {
        "ncm_listen=info,netease_eapi=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

// ── me / refresh ──

fn cmd_me(data_dir: &Path) -> Result<()> {
    let client = EapiClient::new()?;
    let mut session = Session::load(data_dir.join("cookies.json"));
    let info = client.user_info(&mut session)?;
    let Some(info) = info else {
        println!("Not logged in.");
        return Ok(());
    };
    match (signed_in_user_id(&info), user_profile(&info)) {
        (Some(user_id), Some(profile)) => {
            println!("Logged in as: {} (id={user_id})", profile.nickname);
        }
        (Some(user_id), None) => println!("Logged in as user {user_id}"),
        (None, _) => println!("Not logged in."),
    }
    Ok(())
}

fn cmd_refresh(data_dir: &Path) -> Result<()> {
    let client = EapiClient::new()?;
    let mut session = Session::load(data_dir.join("cookies.json"));
    if session.music_u().is_none() {
        bail!("no saved MUSIC_U token, log in with `run` first");
    }
    if client.refresh_session(&mut session)? {
        println!("Token refreshed.");
    } else {
        println!("Token refresh failed.");
    }
    Ok(())
}

// ── run ──

fn cmd_run(
    data_dir: &Path,
    username: Option<String>,
    password: Option<String>,
    cookie: Option<String>,
    play_time: u64,
) -> Result<()> {
    let settings_path = data_dir.join("config.toml");
    let settings = Settings::load(&settings_path)?;

    let client = EapiClient::new()?;
    let mut session = Session::load(data_dir.join("cookies.json"));
    let credentials = match (username, password) {
        (Some(u), Some(p)) => Some((u, p)),
        _ => None,
    };
    let user_id = sign_in(&client, &mut session, credentials, cookie)?;
    info!(user_id, seq = settings.logger.seq, "signed in");

    let mut listener = Listener {
        playlog: PlayLog::new(settings.logger.seq),
        client,
        session,
        settings,
        settings_path,
        queue: VecDeque::new(),
        playing: None,
        play_time,
    };

    let mut scheduler = Scheduler::new();
    scheduler.schedule(Task::NextSong, Duration::ZERO);
    scheduler.schedule(Task::FlushLog, FLUSH_INTERVAL);
    while let Some(task) = scheduler.wait() {
        debug!(?task, "timer fired");
        match task {
            Task::NextSong => {
                let delay = listener.next_song()?;
                scheduler.schedule(Task::NextSong, delay);
            }
            Task::FlushLog => {
                listener.flush_log()?;
                scheduler.schedule(Task::FlushLog, FLUSH_INTERVAL);
            }
        }
    }
    Ok(())
}

/// Make sure the session is logged in and return the user id.
fn sign_in(
    client: &EapiClient,
    session: &mut Session,
    credentials: Option<(String, String)>,
    cookie: Option<String>,
) -> Result<u64> {
    let mut info = client.user_info(session)?;
    if info.as_ref().and_then(signed_in_user_id).is_none() {
        if let Some((username, password)) = credentials {
            if client.login(session, &username, &password, 0)?.is_none() {
                warn!("password login rejected");
            }
        } else if let Some(token) = cookie {
            session.set_session_token(token);
        } else {
            bail!("not logged in: pass --username/--password or --cookie (see --help)");
        }
        info = client.user_info(session)?;
    }

    let user_id = info
        .as_ref()
        .and_then(signed_in_user_id)
        .context("login failed")?;
    session.set_user_id(user_id);
    session
        .cookies()
        .save()
        .context("cannot persist session cookies")?;
    Ok(user_id)
}

struct Playing {
    song: RadioSong,
    started_ms: i64,
    play_time: u64,
}

struct Listener {
    client: EapiClient,
    session: Session,
    playlog: PlayLog,
    settings: Settings,
    settings_path: PathBuf,
    queue: VecDeque<RadioSong>,
    playing: Option<Playing>,
    play_time: u64,
}

impl Listener {
    /// Log the finished song, start the next one and return how long to
    /// wait before calling again.
    fn next_song(&mut self) -> Result<Duration> {
        let started_ms = chrono::Utc::now().timestamp_millis();
        if let Some(done) = self.playing.take() {
            self.playlog.play(&PlayRecord {
                song_id: done.song.id,
                artist_id: done.song.artist_id(),
                play_time: i64::try_from(done.play_time).unwrap_or(i64::MAX),
                fee: done.song.fee,
                source: PlaySource::UserFm {
                    alg: done.song.alg.clone(),
                },
                start_play_time: done.started_ms,
            });
            info!(song = %done.song.name, "listened to a song");
        }

        let Some(song) = self.next_radio_song()? else {
            warn!("radio queue unavailable, retrying in {}s", RADIO_RETRY.as_secs());
            return Ok(RADIO_RETRY);
        };
        let play_time = play_seconds(&song, self.play_time);
        // The desktop client resolves the stream before playing it.
        self.client.playback_urls(
            &mut self.session,
            &[song.id.to_string()],
            DEFAULT_BITRATE,
        )?;
        debug!(song = %song.name, play_time, "playing");

        self.playing = Some(Playing {
            song,
            started_ms,
            play_time,
        });
        Ok(Duration::from_secs(play_time))
    }

    fn next_radio_song(&mut self) -> Result<Option<RadioSong>> {
        if self.queue.is_empty() {
            let Some(songs) = self.client.radio_queue(&mut self.session)? else {
                return Ok(None);
            };
            info!(count = songs.len(), "fetched radio songs");
            self.queue.extend(songs);
        }
        Ok(self.queue.pop_front())
    }

    /// Upload buffered logs; persist the sequence number once accepted.
    fn flush_log(&mut self) -> Result<()> {
        if self.playlog.is_empty() {
            debug!("no playback records to upload");
            return Ok(());
        }
        let log = self.playlog.flush();
        if self.client.upload_playlog(&mut self.session, &log)? {
            self.settings.logger.seq = self.playlog.seq();
            self.settings.save(&self.settings_path)?;
            info!(seq = self.settings.logger.seq, "uploaded playback log");
        } else {
            warn!(bytes = log.len(), "playback log upload failed, records dropped");
        }
        Ok(())
    }
}

/// Seconds to "play" `song`: the override when set, else its full length.
/// Never zero, so a malformed duration cannot spin the loop.
fn play_seconds(song: &RadioSong, play_time: u64) -> u64 {
    let secs = if play_time > 0 {
        play_time
    } else {
        song.duration_ms / 1000
    };
    secs.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(duration_ms: u64) -> RadioSong {
        RadioSong {
            id: 1,
            name: "a".into(),
            artists: Vec::new(),
            duration_ms,
            alg: "alg".into(),
            fee: 0,
        }
    }

    #[test]
    fn play_time_override_wins() {
        assert_eq!(play_seconds(&song(269_000), 30), 30);
        assert_eq!(play_seconds(&song(269_999), 0), 269);
        assert_eq!(play_seconds(&song(0), 0), 1);
    }

    #[test]
    fn run_args() {
        let cli = Cli::try_parse_from([
            "ncm-listen", "run", "-u", "me@163.com", "-p", "pw", "-t", "45",
        ])
        .unwrap();
        match cli.command {
            Command::Run {
                username,
                password,
                cookie,
                play_time,
            } => {
                assert_eq!(username.as_deref(), Some("me@163.com"));
                assert_eq!(password.as_deref(), Some("pw"));
                assert!(cookie.is_none());
                assert_eq!(play_time, 45);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn play_time_is_bounded() {
        assert!(Cli::try_parse_from(["ncm-listen", "run", "-t", "86400"]).is_ok());
        assert!(Cli::try_parse_from(["ncm-listen", "run", "-t", "86401"]).is_err());
        let max = u64::MAX.to_string();
        assert!(Cli::try_parse_from(["ncm-listen", "run", "-t", max.as_str()]).is_err());
    }

    #[test]
    fn username_requires_password() {
        assert!(Cli::try_parse_from(["ncm-listen", "run", "-u", "me"]).is_err());
    }

    #[test]
    fn global_data_dir() {
        let cli = Cli::try_parse_from(["ncm-listen", "me", "--data-dir", "/tmp/x"]).unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
        assert!(matches!(cli.command, Command::Me));
    }
}
