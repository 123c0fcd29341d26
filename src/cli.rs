//! Command-line surface over [`AppState`].

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;

use crate::{
    agent::AgentKind,
    auth::{AuthService, User},
    avatar::{draw_avatar, AvatarFrame, CommandRecorder, MotionConfig, Persona, SizePreset},
    catalog::{Doctor, HospitalTool, Location, Medicine},
    search::{
        geo::{nearest_first, within_radius, GeoPoint},
        DirectoryView, Searchable,
    },
    session::{Script, SessionEvent, SessionSummary},
    AppState,
};

#[derive(Parser, Debug)]
#[command(name = "aarogya", about = "Healthcare directory search and simulated AI consultations")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Default)]
pub struct SearchArgs {
    /// Free-text query, matched case-insensitively.
    #[arg(long, short)]
    pub query: Option<String>,
    /// Facet selection as `name=value`; repeatable. `value` may be `all`.
    #[arg(long = "facet", value_parser = parse_facet)]
    pub facets: Vec<(String, String)>,
    /// Print per-value counts of this facet over the whole collection.
    #[arg(long)]
    pub counts: Option<String>,
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Doctors(SearchArgs),
    Medicines(SearchArgs),
    Tools(SearchArgs),
    Locations {
        #[command(flatten)]
        search: SearchArgs,
        /// `lat,lng` to search around.
        #[arg(long, value_parser = parse_point)]
        near: Option<GeoPoint>,
        /// Radius in km around `--near` (defaults to the configured radius).
        #[arg(long)]
        radius: Option<f64>,
    },
    /// Run a simulated consultation and print its clock.
    Session {
        /// Override the duration limit.
        #[arg(long)]
        seconds: Option<u64>,
        #[arg(long, value_enum, default_value_t = AgentArg::Doctor)]
        agent: AgentArg,
        #[arg(long, value_enum, default_value_t = ScriptArg::Consultation)]
        script: ScriptArg,
    },
    /// Describe one avatar frame.
    Avatar {
        #[arg(long, value_enum, default_value_t = AgentArg::Doctor)]
        agent: AgentArg,
        #[arg(long, value_enum, default_value_t = SizeArg::Md)]
        size: SizeArg,
        #[arg(long, default_value_t = 0.0)]
        frame: f64,
        #[arg(long)]
        idle: bool,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: String,
    },
    Logout,
    Whoami,
    /// Past consultations of the signed-in user.
    History,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AgentArg {
    Doctor,
    Nurse,
    Specialist,
}

impl From<AgentArg> for AgentKind {
    fn from(arg: AgentArg) -> Self {
        match arg {
            AgentArg::Doctor => AgentKind::Doctor,
            AgentArg::Nurse => AgentKind::Nurse,
            AgentArg::Specialist => AgentKind::Specialist,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SizeArg {
    Sm,
    Md,
    Lg,
}

impl From<SizeArg> for SizePreset {
    fn from(arg: SizeArg) -> Self {
        match arg {
            SizeArg::Sm => SizePreset::Small,
            SizeArg::Md => SizePreset::Medium,
            SizeArg::Lg => SizePreset::Large,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ScriptArg {
    Consultation,
    Doctors,
    Medicines,
}

impl ScriptArg {
    fn script(self) -> Script {
        use crate::session::script::{CONSULTATION_GUIDE, DOCTORS_GUIDE, MEDICINES_GUIDE};
        match self {
            ScriptArg::Consultation => Script::from_text(CONSULTATION_GUIDE),
            ScriptArg::Doctors => Script::from_text(DOCTORS_GUIDE),
            ScriptArg::Medicines => Script::from_text(MEDICINES_GUIDE),
        }
    }
}

fn parse_facet(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected name=value, got '{raw}'")),
    }
}

fn parse_point(raw: &str) -> Result<GeoPoint, String> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected lat,lng, got '{raw}'"))?;
    let lat: f64 = lat.trim().parse().map_err(|err| format!("bad latitude: {err}"))?;
    let lng: f64 = lng.trim().parse().map_err(|err| format!("bad longitude: {err}"))?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(format!("coordinates out of range: {raw}"));
    }
    Ok(GeoPoint::new(lat, lng))
}

/// One-line rendering of a record in search output.
trait Listing {
    fn listing(&self) -> String;
}

impl Listing for Doctor {
    fn listing(&self) -> String {
        format!(
            "#{} {} - {} ({}, {}){}",
            self.id,
            self.name,
            self.specialty,
            self.hospital,
            self.city,
            if self.telemedicine { " [telemedicine]" } else { "" }
        )
    }
}

impl Listing for Medicine {
    fn listing(&self) -> String {
        format!(
            "#{} {} ({}) - {} | Jan Aushadhi {} vs brand {}",
            self.id, self.name, self.generic_name, self.category, self.jan_aushadhi_price, self.brand_price
        )
    }
}

impl Listing for HospitalTool {
    fn listing(&self) -> String {
        format!(
            "#{} {} - {} / {} [{}] {}",
            self.id,
            self.name,
            self.category,
            self.subcategory,
            self.complexity.as_str(),
            self.price_range
        )
    }
}

impl Listing for Location {
    fn listing(&self) -> String {
        format!("#{} {} ({}) - {}, {}", self.id, self.name, self.kind, self.address, self.city)
    }
}

/// Applies `args` to a freshly mounted view of `records`.
pub fn search<'a, R: Searchable>(records: &'a [R], args: &SearchArgs) -> Result<DirectoryView<'a, R>> {
    let mut view = DirectoryView::mount(records);
    if let Some(query) = &args.query {
        view.set_query(query);
    }
    for (name, value) in &args.facets {
        if !R::FACETS.contains(&name.as_str()) {
            bail!("unknown facet '{name}'; expected one of: {}", R::FACETS.join(", "));
        }
        view.select(name, value);
    }
    Ok(view)
}

fn print_search<R: Searchable + Listing + Serialize>(records: &[R], args: &SearchArgs) -> Result<()> {
    let view = search(records, args)?;

    if let Some(facet) = &args.counts {
        if !R::FACETS.contains(&facet.as_str()) {
            bail!("unknown facet '{facet}'; expected one of: {}", R::FACETS.join(", "));
        }
        for (value, count) in view.counts(facet) {
            println!("{value}: {count}");
        }
        return Ok(());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(view.results())?);
        return Ok(());
    }

    for record in view.results() {
        println!("{}", record.listing());
    }
    println!("{} of {} shown", view.len(), view.total());
    Ok(())
}

fn signed_in(auth: &AuthService) -> Result<User> {
    auth.current_user()
        .context("Please login to continue. Try `aarogya login --email demo@aarogyaai.com --password demo123`.")
}

pub async fn execute(cli: Cli, app: AppState) -> Result<()> {
    match cli.command {
        Command::Doctors(args) => print_search(app.catalog.doctors(), &args),
        Command::Medicines(args) => print_search(app.catalog.medicines(), &args),
        Command::Tools(args) => print_search(app.catalog.hospital_tools(), &args),
        Command::Locations { search: args, near, radius } => match near {
            None => print_search(app.catalog.locations(), &args),
            Some(origin) => {
                let radius = radius.unwrap_or(app.config.search.default_radius_km);
                let view = search(app.catalog.locations(), &args)?;
                let mut hits = within_radius(view.results().iter().copied(), origin, radius);
                nearest_first(&mut hits);
                for (location, distance) in &hits {
                    println!("{:>6.2} km  {}", distance, location.listing());
                    println!("          {}", location.directions_url(origin));
                }
                println!("{} within {radius} km", hits.len());
                Ok(())
            }
        },
        Command::Session {
            seconds,
            agent,
            script,
        } => run_session(app, seconds, agent.into(), script.script()).await,
        Command::Avatar {
            agent,
            size,
            frame,
            idle,
        } => {
            let mut canvas = CommandRecorder::new();
            let persona = Persona::for_agent(agent.into());
            let avatar = AvatarFrame {
                persona,
                size: size.into(),
                frame,
                active: !idle,
                show_pulse: true,
            };
            let pose = draw_avatar(&mut canvas, &avatar, &MotionConfig::default());
            println!(
                "{} on a {}x{} canvas: {} draw commands",
                persona.name,
                canvas.size.0,
                canvas.size.1,
                canvas.len()
            );
            println!("{pose:#?}");
            Ok(())
        }
        Command::Login { email, password } => {
            let user = app.auth.login(&email, &password)?;
            println!("Signed in as {} ({:?})", user.name, user.subscription);
            Ok(())
        }
        Command::Register {
            email,
            password,
            name,
        } => {
            let user = app.auth.register(&email, &password, &name)?;
            println!("Welcome, {}! Your id is {}", user.name, user.id);
            Ok(())
        }
        Command::Logout => {
            app.auth.logout()?;
            println!("Signed out");
            Ok(())
        }
        Command::Whoami => {
            match app.auth.current_user() {
                Some(user) => println!("{} <{}> {:?}", user.name, user.email, user.subscription),
                None => println!("Not signed in"),
            }
            Ok(())
        }
        Command::History => {
            let user = signed_in(&app.auth)?;
            app.recover_interrupted_consultations().await?;
            let consultations = app.db.list_consultations(&user.id).await?;
            if consultations.is_empty() {
                println!("No consultations yet");
            }
            for consultation in consultations {
                println!(
                    "{}  {:<15} {:<10} {}",
                    consultation.started_at.format("%Y-%m-%d %H:%M"),
                    consultation.agent.display_name(),
                    consultation.status.as_str(),
                    consultation.duration_label()
                );
            }
            Ok(())
        }
    }
}

async fn run_session(app: AppState, seconds: Option<u64>, agent: AgentKind, script: Script) -> Result<()> {
    let user = app.auth.current_user();
    let controller = app.session_controller(agent, script, seconds)?;
    app.recover_interrupted_consultations().await?;
    let mut events = controller.subscribe();

    let started = controller.start(user.as_ref()).await?;
    println!("Connecting to {}...", agent.display_name());
    if let Some(line) = &started.script_line {
        println!("  \"{line}\"");
    }

    let summary: SessionSummary = loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(SessionEvent::StateChanged(snapshot)) => {
                    println!("[{}] {:?}", snapshot.clock, snapshot.phase);
                }
                Ok(SessionEvent::Tick { elapsed_secs, remaining_secs }) => {
                    println!(
                        "[{}] {} left",
                        crate::session::format_clock(elapsed_secs),
                        crate::session::format_clock(remaining_secs)
                    );
                }
                Ok(SessionEvent::ScriptAdvanced { line, .. }) => println!("  \"{line}\""),
                Ok(SessionEvent::Ended(summary)) => break summary,
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => bail!("session event stream closed"),
            },
            _ = tokio::signal::ctrl_c() => {
                break controller.end().await?;
            }
        }
    };

    println!(
        "Consultation {} {} after {}",
        summary.session_id,
        summary.status.as_str().to_lowercase(),
        crate::session::format_clock(summary.elapsed_secs)
    );
    Ok(())
}
