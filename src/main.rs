use anyhow::Result;
use biotica::app::App;
use biotica_core::router::ToolRouter;
use biotica_core::{Preset, WorldInit};
use biotica_data::TuningPatch;
use biotica_observer::{fallback, AiConfig, DescriptionService};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(author, version, about = "Deterministic seeded world simulator", long_about = None)]
struct Args {
    /// Directory holding save slots
    #[arg(long, default_value = "saves")]
    save_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PresetArg {
    Lush,
    Temperate,
    Arid,
    Archipelago,
}

impl From<PresetArg> for Preset {
    fn from(p: PresetArg) -> Self {
        match p {
            PresetArg::Lush => Preset::Lush,
            PresetArg::Temperate => Preset::Temperate,
            PresetArg::Arid => Preset::Arid,
            PresetArg::Archipelago => Preset::Archipelago,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a world and run it
    Create {
        #[arg(long, default_value = "world")]
        name: String,
        #[arg(long, default_value_t = 1)]
        seed: u32,
        #[arg(long, value_enum, default_value = "temperate")]
        preset: PresetArg,
        #[arg(long, default_value_t = 128)]
        width: u16,
        #[arg(long, default_value_t = 80)]
        height: u16,
        #[arg(long, default_value_t = 1.0)]
        event_rate: f32,
        #[arg(long)]
        tree_density: Option<f32>,
        /// 0 or 1
        #[arg(long, default_value_t = 1)]
        volcano_count: u8,
        #[arg(long, default_value_t = 1.0)]
        speed: f32,
        #[arg(long, default_value_t = 300)]
        creatures: usize,
        #[arg(long)]
        disable_civs: bool,
        #[arg(long)]
        disable_predators: bool,
        /// Accept a genesis tuning patch produced by an external tuner
        #[arg(long)]
        enable_gene_agent: bool,
        /// TOML file holding the tuning patch (requires --enable-gene-agent)
        #[arg(long)]
        tuning_file: Option<PathBuf>,
        /// Ticks to run before exiting
        #[arg(long, default_value_t = 0)]
        ticks: u64,
        /// Pace ticks against the wall clock instead of fast-forwarding
        #[arg(long)]
        realtime: bool,
        /// Save into this slot on exit
        #[arg(long)]
        save_slot: Option<String>,
    },
    /// Load a saved world and continue it
    Load {
        world_id: Uuid,
        #[arg(long)]
        slot: Option<String>,
        #[arg(long, default_value_t = 0)]
        ticks: u64,
        /// Scheduler speed multiplier (snapped to 0.25/0.5/1/2/5/10)
        #[arg(long)]
        speed: Option<f64>,
        /// Discard the loaded state and restart the world from this seed
        #[arg(long)]
        reset_seed: Option<u32>,
        #[arg(long)]
        realtime: bool,
        #[arg(long)]
        save_slot: Option<String>,
    },
    /// List saved worlds and their slots
    Worlds,
    /// Print the deterministic state hash of a fresh run
    Hash {
        #[arg(long, default_value_t = 12345)]
        seed: u32,
        #[arg(long, default_value_t = 2000)]
        ticks: u64,
        #[arg(long, default_value_t = 128)]
        width: u16,
        #[arg(long, default_value_t = 80)]
        height: u16,
    },
    /// Describe an entity of a saved world via the text service (best effort)
    Describe {
        world_id: Uuid,
        #[arg(long)]
        slot: Option<String>,
        #[arg(long)]
        creature: Option<u64>,
        #[arg(long)]
        species: Option<String>,
        #[arg(long)]
        civ: Option<u32>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            let code = err
                .downcast_ref::<biotica_io::LoadError>()
                .map(biotica_io::LoadError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code as u8)
        }
    }
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Create {
            name,
            seed,
            preset,
            width,
            height,
            event_rate,
            tree_density,
            volcano_count,
            speed,
            creatures,
            disable_civs,
            disable_predators,
            enable_gene_agent,
            tuning_file,
            ticks,
            realtime,
            save_slot,
        } => {
            anyhow::ensure!(volcano_count <= 1, "volcano-count must be 0 or 1");
            let mut app = App::create(
                WorldInit {
                    name,
                    seed,
                    preset: preset.into(),
                    width,
                    height,
                    event_rate,
                    tree_density,
                    volcano_count,
                    simulation_speed: speed,
                    initial_creatures: creatures,
                    enable_civs: !disable_civs,
                    enable_predators: !disable_predators,
                    enable_gene_agent,
                },
                args.save_dir,
            );

            if let Some(path) = tuning_file {
                anyhow::ensure!(
                    enable_gene_agent,
                    "--tuning-file requires --enable-gene-agent"
                );
                let text = std::fs::read_to_string(&path)?;
                let patch: TuningPatch = toml::from_str(&text)?;
                let token = app.sim.reset_token();
                app.sim.accept_genesis(
                    &patch,
                    vec![format!("cli:{}", path.display())],
                    token,
                );
            }

            run_and_report(&mut app, ticks, realtime, save_slot.as_deref())
        }
        Command::Load {
            world_id,
            slot,
            ticks,
            speed,
            reset_seed,
            realtime,
            save_slot,
        } => {
            let mut app = App::load(world_id, slot.as_deref(), args.save_dir)?;
            if let Some(speed) = speed {
                app.set_speed(speed);
            }
            if let Some(seed) = reset_seed {
                app.reset(seed);
            }
            run_and_report(&mut app, ticks, realtime, save_slot.as_deref())
        }
        Command::Worlds => {
            let store = biotica_io::SaveStore::new(args.save_dir);
            for world_id in store.list_worlds()? {
                let slots = store.list_slots(world_id)?;
                println!("{world_id}  [{}]", slots.join(", "));
            }
            Ok(())
        }
        Command::Hash {
            seed,
            ticks,
            width,
            height,
        } => {
            let mut sim = biotica_core::Simulation::new(WorldInit {
                seed,
                width,
                height,
                ..WorldInit::default()
            });
            sim.run_ticks(ticks);
            println!("{}", sim.state_hash());
            Ok(())
        }
        Command::Describe {
            world_id,
            slot,
            creature,
            species,
            civ,
        } => {
            let app = App::load(world_id, slot.as_deref(), args.save_dir)?;
            let text = describe(&app, creature, species.as_deref(), civ)?;
            println!("{text}");
            Ok(())
        }
    }
}

fn run_and_report(app: &mut App, ticks: u64, realtime: bool, save_slot: Option<&str>) -> Result<()> {
    if ticks > 0 {
        if realtime {
            app.run_realtime(ticks);
        } else {
            app.run_fast(ticks);
        }
    }
    if let Some(slot) = save_slot {
        let path = app.save(slot)?;
        println!("saved {} -> {}", app.world_id, path.display());
    }
    println!("{}", app.summary()?);
    Ok(())
}

/// Best-effort prose via the configured provider, with deterministic
/// fallbacks when the service is absent.
fn describe(
    app: &App,
    creature: Option<u64>,
    species: Option<&str>,
    civ: Option<u32>,
) -> Result<String> {
    let router = ToolRouter::new(&app.sim);
    let seed = app.sim.world.seed;
    let config = AiConfig::from_env();
    let service = DescriptionService::from_config(config);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    if let Some(id) = creature {
        let c = router.get_creature(id).map_err(anyhow::Error::new)?;
        let rec = app.sim.registry.get(&c.species_id);
        let fb = fallback::creature_description(&c, rec, seed);
        let prompt = format!(
            "Describe, in two sentences, a creature of species '{}' aged {} at ({}, {}).",
            c.species_id, c.age, c.x, c.y
        );
        return Ok(runtime.block_on(service.describe(
            "creature",
            &fallback::creature_key(id),
            &prompt,
            fb,
        )));
    }
    if let Some(id) = species {
        let rec = router.get_species(id).map_err(anyhow::Error::new)?;
        let fb = fallback::species_description(&rec, seed);
        let prompt = format!(
            "Describe, in two sentences, the species '{}' ({:?}, population {}).",
            rec.common_name, rec.diet_kind, rec.population
        );
        return Ok(runtime.block_on(service.describe(
            "species",
            &fallback::species_key(id),
            &prompt,
            fb,
        )));
    }
    if let Some(id) = civ {
        let f = app
            .sim
            .civ
            .faction(id)
            .ok_or_else(|| anyhow::anyhow!("faction {id} not found"))?;
        let fb = fallback::faction_description(f, seed);
        let prompt = format!(
            "Describe, in two sentences, a tribal faction of {} members with strategy {:?}.",
            f.population, f.strategy
        );
        return Ok(runtime.block_on(service.describe(
            "civ",
            &fallback::civ_key(id),
            &prompt,
            fb,
        )));
    }
    anyhow::bail!("pass one of --creature, --species, --civ")
}
