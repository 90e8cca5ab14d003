#![forbid(unsafe_code)]
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use garde::{
    io,
    report::{ReportRenderer, TextReport},
    rule::load_rule_from_file,
    scheduler::{AnnealOptions, GenerateInput, SchedError, Scheduler},
    storage::{JsonStorage, ScheduleStore},
    Member, NurseId, WardSchedule, YearMonth,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de génération de plannings infirmiers (sans base de données)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON du planning du mois
    #[arg(long, global = true, default_value = "schedule.json")]
    schedule: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Créer le planning d'un mois (révision 0, tout à X)
    Init {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
        /// CSV `id,name[,eligibility][,intensity]`
        #[arg(long)]
        roster: String,
        #[arg(long, default_value = "ward")]
        ward: String,
    },

    /// Effectif minimal théorique pour un mois
    Needed {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
        /// Règle JSON
        #[arg(long)]
        rule: String,
        #[arg(long)]
        roster: String,
    },

    /// Générer une nouvelle révision par recuit simulé
    Generate {
        #[arg(long)]
        rule: String,
        #[arg(long)]
        roster: String,
        /// CSV `nurse_id,day,shift[,reinforced][,memo]`
        #[arg(long)]
        requests: Option<String>,
        /// Planning JSON du mois précédent
        #[arg(long)]
        prev: Option<String>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        iterations: Option<usize>,
        /// Budget horloge en secondes
        #[arg(long)]
        time_budget: Option<u64>,
        /// Ignore le contrôle d'effectif minimal
        #[arg(long)]
        force: bool,
        #[arg(long)]
        author: Option<u64>,
    },

    /// Scorer la révision courante
    Score {
        #[arg(long)]
        rule: String,
        #[arg(long)]
        roster: String,
        #[arg(long)]
        requests: Option<String>,
        #[arg(long)]
        prev: Option<String>,
    },

    /// Afficher et optionnellement exporter la révision courante
    Show {
        #[arg(long)]
        roster: Option<String>,
        #[arg(long)]
        out_json: Option<String>,
        #[arg(long)]
        out_csv: Option<String>,
    },
}

fn month_of(year: i32, month: u32) -> Result<YearMonth> {
    Ok(YearMonth::new(year, month).ok_or(SchedError::InvalidMonth { year, month })?)
}

fn load_previous(path: Option<String>) -> Result<Option<WardSchedule>> {
    path.map(|p| JsonStorage::open(p)?.load()).transpose()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let storage = JsonStorage::open(&cli.schedule)?;

    let code = match cli.cmd {
        Commands::Init {
            year,
            month,
            roster,
            ward,
        } => {
            if storage.exists() {
                bail!("{} already exists", storage.path().display());
            }
            let members = io::import_roster_csv(roster)?;
            let schedule = WardSchedule::initialize(ward, month_of(year, month)?, &members);
            storage.save(&schedule)?;
            println!("initialized {} ({} nurses)", schedule.month, members.len());
            0
        }
        Commands::Needed {
            year,
            month,
            rule,
            roster,
        } => {
            let rule = load_rule_from_file(rule)?;
            let members = io::import_roster_csv(roster)?;
            let scheduler = Scheduler::new(rule, month_of(year, month)?, members)?;
            let needed = scheduler.needed_nurses();
            println!("needed: {needed}, available: {}", scheduler.members().len());
            if scheduler.members().len() < needed {
                2
            } else {
                0
            }
        }
        Commands::Generate {
            rule,
            roster,
            requests,
            prev,
            seed,
            iterations,
            time_budget,
            force,
            author,
        } => {
            let schedule = storage.load()?;
            let rule = load_rule_from_file(rule)?;
            let members: Vec<Member> = io::import_roster_csv(roster)?;
            let requests = match requests {
                Some(path) => io::import_requests_csv(path)?,
                None => Vec::new(),
            };
            let previous = load_previous(prev)?;

            let mut options = AnnealOptions::default();
            if let Some(n) = iterations {
                options = options.with_iterations(n);
            }
            options.time_budget = time_budget.map(std::time::Duration::from_secs);

            let scheduler = Scheduler::new(rule, schedule.month, members)?.with_options(options);
            let mut rng = match seed {
                Some(s) => ChaCha8Rng::seed_from_u64(s),
                None => ChaCha8Rng::from_os_rng(),
            };
            let input = GenerateInput {
                schedule: Some(&schedule),
                previous: previous.as_ref(),
                requests: &requests,
                author: author.map(NurseId::new),
                force,
            };
            let outcome = scheduler.generate(input, &mut rng)?;

            println!(
                "score: {:.2} -> {:.2} ({} iterations, {} reheats)",
                outcome.initial.total(),
                outcome.best.total(),
                outcome.stats.iterations,
                outcome.stats.reheats
            );
            print!("{}", TextReport.render(&outcome.unreflected));
            if outcome.changed {
                storage.save(&outcome.schedule)?;
                println!("saved revision {}", outcome.schedule.now_idx);
                0
            } else {
                println!("already optimal: revision unchanged");
                // Code 3 = rien à enregistrer
                3
            }
        }
        Commands::Score {
            rule,
            roster,
            requests,
            prev,
        } => {
            let schedule = storage.load()?;
            let rule = load_rule_from_file(rule)?;
            let members = io::import_roster_csv(roster)?;
            let requests = match requests {
                Some(path) => io::import_requests_csv(path)?,
                None => Vec::new(),
            };
            let previous = load_previous(prev)?;
            let duty = schedule
                .current()
                .context("schedule has no current revision")?;
            let scheduler = Scheduler::new(rule, schedule.month, members)?;
            let breakdown = scheduler.evaluate_duty(duty, previous.as_ref(), &requests);
            println!("{breakdown}");
            println!("hard            {:>10.2}", breakdown.hard());
            0
        }
        Commands::Show {
            roster,
            out_json,
            out_csv,
        } => {
            let schedule = storage.load()?;
            let duty = schedule
                .current()
                .context("schedule has no current revision")?;
            let members = match roster {
                Some(path) => io::import_roster_csv(path)?,
                None => Vec::new(),
            };
            if let Some(path) = out_json {
                io::export_duty_json(path, duty)?;
            }
            if let Some(path) = out_csv {
                io::export_duty_csv(path, duty, &members)?;
            }
            println!(
                "{} | revision {} ({})",
                schedule.month, duty.idx, duty.history.label
            );
            // impression compacte
            for row in &duty.rows {
                let name = members
                    .iter()
                    .find(|m| m.id == row.nurse)
                    .map(|m| m.name.as_str())
                    .unwrap_or("-");
                println!("{:>6} {:<12} {}", row.nurse.get(), name, row.shifts);
            }
            0
        }
    };

    std::process::exit(code);
}
