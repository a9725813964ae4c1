//! Scenario files
//!
//! A scenario describes a small skirmish in TOML: the unit type catalog,
//! equivalences, player setup, starting units, force layout, attrition and
//! a schedule of directives the AI script would issue. `Scenario::build`
//! turns it into a `ScenarioRun` ready to be stepped.

pub mod run;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::ai::force::{ForceRole, HelpMode, PopulateMode};
use crate::ai::manager::ForceManager;
use crate::core::config::ForceManagerConfig;
use crate::core::error::{ForceError, Result};
use crate::core::types::{ForceId, PlayerId, PowerBudget, TilePos, UnitTypeId};
use crate::simulation::{SimWorld, UnitTypeCatalog, UnitTypeDef, UnitWorld};

pub use run::{ForceSummary, RunEvent, RunSummary, ScenarioRun, TickReport};

/// A unit type and a count, used for wants and reinforcements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitCount {
    pub unit_type: String,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSetup {
    pub id: u8,
    #[serde(default)]
    pub start: TilePos,
    /// Restrict the player to these types; all types when absent
    #[serde(default)]
    pub available: Option<Vec<String>>,
}

/// Units present at tick 0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitGroup {
    /// Defaults to the AI player
    #[serde(default)]
    pub owner: Option<u8>,
    pub unit_type: String,
    #[serde(default = "default_group_count")]
    pub count: usize,
    /// Defaults to the owner's start position
    #[serde(default)]
    pub position: Option<TilePos>,
}

fn default_group_count() -> usize {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForceSetup {
    pub id: usize,
    #[serde(default)]
    pub role: ForceRole,
    #[serde(default)]
    pub populate_mode: PopulateMode,
    #[serde(default)]
    pub help_mode: HelpMode,
    /// Keeps the manager's default when absent
    #[serde(default)]
    pub reusable: Option<bool>,
    #[serde(default)]
    pub state: i32,
    #[serde(default)]
    pub wants: Vec<UnitCount>,
}

/// Random losses and periodic reinforcements of the AI player
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Attrition {
    /// Chance per tick that any one live unit dies
    pub loss_chance: f64,
    /// Reinforcement period in ticks; 0 disables reinforcements
    pub reinforce_every: u32,
    pub reinforcements: Vec<UnitCount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DirectiveAction {
    Synthesize,
    Complete,
    Attack,
    Group,
    Home,
    Erase,
}

/// A directive as written in the scenario file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectiveSetup {
    pub tick: u32,
    pub action: DirectiveAction,
    pub force: usize,
    #[serde(default)]
    pub power: Option<[i32; 3]>,
    #[serde(default)]
    pub candidates: Vec<String>,
    #[serde(default)]
    pub at: Option<TilePos>,
}

/// A validated directive with resolved ids
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Synthesize {
        force: ForceId,
        power: PowerBudget,
        candidates: Vec<UnitTypeId>,
    },
    Complete { force: ForceId },
    Attack { force: ForceId, at: TilePos },
    Group { force: ForceId, at: TilePos },
    Home { force: ForceId },
    Erase { force: ForceId },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub ai_player: u8,
    #[serde(default)]
    pub config: ForceManagerConfig,
    pub unit_types: Vec<UnitTypeDef>,
    /// Groups of interchangeable unit types
    #[serde(default)]
    pub equivalences: Vec<Vec<String>>,
    #[serde(default)]
    pub players: Vec<PlayerSetup>,
    #[serde(default)]
    pub units: Vec<UnitGroup>,
    #[serde(default)]
    pub forces: Vec<ForceSetup>,
    #[serde(default)]
    pub attrition: Attrition,
    #[serde(default)]
    pub directives: Vec<DirectiveSetup>,
}

impl Scenario {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let scenario = Self::from_toml_str(&contents)?;
        tracing::info!("Loaded scenario '{}' from {}", scenario.name, path.display());
        Ok(scenario)
    }

    /// Set up the world and the AI player's force manager
    ///
    /// Free units are assigned once before returning, so tick 0 starts
    /// from a settled roster.
    pub fn build(&self) -> Result<ScenarioRun> {
        if !(0.0..=1.0).contains(&self.attrition.loss_chance) {
            return Err(ForceError::InvalidScenario(format!(
                "loss_chance {} is not a probability",
                self.attrition.loss_chance
            )));
        }

        let catalog = UnitTypeCatalog::from_defs(self.unit_types.iter().cloned())?;
        let ai_player = PlayerId(self.ai_player);
        let mut world = SimWorld::new(catalog);

        for player in &self.players {
            let id = PlayerId(player.id);
            world.set_start_position(id, player.start);
            if let Some(available) = &player.available {
                let types = resolve_all(&world.catalog, available)?;
                world.set_available(id, types);
            }
        }

        let mut manager = ForceManager::new(ai_player, self.config.clone(), &world)?;

        for group in &self.equivalences {
            let types = resolve_all(&world.catalog, group)?;
            if let Some((first, rest)) = types.split_first() {
                for other in rest {
                    manager.equivalence_mut().merge(*first, *other);
                }
            }
        }

        for setup in &self.forces {
            let wants = setup
                .wants
                .iter()
                .map(|w| Ok((world.catalog.resolve(&w.unit_type)?, w.count)))
                .collect::<Result<Vec<_>>>()?;

            let force = manager.checked_force_mut(ForceId(setup.id))?;
            force.role = setup.role;
            force.populate_mode = setup.populate_mode;
            force.help_mode = setup.help_mode;
            force.state = setup.state;
            if let Some(reusable) = setup.reusable {
                force.units_reusable = reusable;
            }
            for (unit_type, count) in wants {
                force.set_want(unit_type, count);
            }
        }

        for group in &self.units {
            let owner = group.owner.map_or(ai_player, PlayerId);
            let unit_type = world.catalog.resolve(&group.unit_type)?;
            let position = group
                .position
                .unwrap_or_else(|| world.start_position(owner));
            for _ in 0..group.count {
                world.spawn(owner, unit_type, position);
            }
        }

        let reinforcements = self
            .attrition
            .reinforcements
            .iter()
            .map(|r| Ok((world.catalog.resolve(&r.unit_type)?, r.count)))
            .collect::<Result<Vec<_>>>()?;

        let mut schedule = self
            .directives
            .iter()
            .map(|d| Ok((d.tick, self.resolve_directive(&world.catalog, &manager, d)?)))
            .collect::<Result<Vec<_>>>()?;
        schedule.sort_by_key(|(tick, _)| *tick);

        manager.run(&mut world);
        tracing::info!(
            "Scenario '{}' ready: {} units, {} directives",
            self.name,
            world.unit_count(),
            schedule.len()
        );

        Ok(ScenarioRun::new(
            self.name.clone(),
            world,
            manager,
            self.attrition.loss_chance,
            self.attrition.reinforce_every,
            reinforcements,
            schedule,
        ))
    }

    fn resolve_directive(
        &self,
        catalog: &UnitTypeCatalog,
        manager: &ForceManager,
        setup: &DirectiveSetup,
    ) -> Result<Directive> {
        let force = ForceId(setup.force);
        if manager.get_force(force).is_none() {
            return Err(ForceError::ForceNotFound(force));
        }
        let target = || {
            setup.at.ok_or_else(|| {
                ForceError::InvalidScenario(format!(
                    "{:?} directive at tick {} needs a target position",
                    setup.action, setup.tick
                ))
            })
        };

        let directive = match setup.action {
            DirectiveAction::Synthesize => {
                let [land, air, sea] = setup.power.ok_or_else(|| {
                    ForceError::InvalidScenario(format!(
                        "synthesis at tick {} needs a power budget",
                        setup.tick
                    ))
                })?;
                Directive::Synthesize {
                    force,
                    power: PowerBudget::new(land, air, sea),
                    candidates: resolve_all(catalog, &setup.candidates)?,
                }
            }
            DirectiveAction::Complete => Directive::Complete { force },
            DirectiveAction::Attack => Directive::Attack { force, at: target()? },
            DirectiveAction::Group => Directive::Group { force, at: target()? },
            DirectiveAction::Home => Directive::Home { force },
            DirectiveAction::Erase => Directive::Erase { force },
        };
        Ok(directive)
    }
}

fn resolve_all(catalog: &UnitTypeCatalog, idents: &[String]) -> Result<Vec<UnitTypeId>> {
    idents.iter().map(|ident| catalog.resolve(ident)).collect()
}
