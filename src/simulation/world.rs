//! In-memory simulation: a generational unit arena
//!
//! Units are owned here. The AI only holds `UnitHandle`s and signals shared
//! ownership through the ref-count pair; `collect_garbage` frees dead units
//! nobody references any more.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::core::types::{PlayerId, TilePos, UnitHandle, UnitTypeId};
use crate::simulation::{
    OrderKind, OrderSink, UnitStatus, UnitTypeCatalog, UnitTypeInfo, UnitTypeRules, UnitWorld,
};

/// A simulated unit
#[derive(Debug, Clone)]
pub struct SimUnit {
    pub owner: PlayerId,
    pub unit_type: UnitTypeId,
    pub hp: u32,
    pub destroyed: bool,
    pub order: OrderKind,
    pub active: bool,
    pub position: TilePos,
    pub refs: u32,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    unit: Option<SimUnit>,
}

/// An order the AI issued through `OrderSink`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssuedOrder {
    Move {
        unit: UnitHandle,
        to: TilePos,
    },
    Attack {
        unit: UnitHandle,
        at: TilePos,
        target: Option<UnitHandle>,
    },
}

impl IssuedOrder {
    pub fn unit(&self) -> UnitHandle {
        match self {
            IssuedOrder::Move { unit, .. } | IssuedOrder::Attack { unit, .. } => *unit,
        }
    }
}

/// The simulated game state the force manager runs against
#[derive(Debug, Default)]
pub struct SimWorld {
    pub catalog: UnitTypeCatalog,
    slots: Vec<Slot>,
    free_slots: Vec<u32>,
    /// Players listed here may only use the listed types; others use all
    availability: AHashMap<PlayerId, AHashSet<UnitTypeId>>,
    start_positions: AHashMap<PlayerId, TilePos>,
    pub order_log: Vec<IssuedOrder>,
    pub defense_requests: Vec<(PlayerId, TilePos)>,
}

impl SimWorld {
    pub fn new(catalog: UnitTypeCatalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    pub fn spawn(&mut self, owner: PlayerId, unit_type: UnitTypeId, position: TilePos) -> UnitHandle {
        let unit = SimUnit {
            owner,
            unit_type,
            hp: 100,
            destroyed: false,
            order: OrderKind::Idle,
            active: true,
            position,
            refs: 0,
        };

        if let Some(index) = self.free_slots.pop() {
            let slot = &mut self.slots[index as usize];
            slot.unit = Some(unit);
            UnitHandle::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                unit: Some(unit),
            });
            UnitHandle::new(index, 0)
        }
    }

    pub fn get(&self, handle: UnitHandle) -> Option<&SimUnit> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.unit.as_ref())
    }

    pub fn get_mut(&mut self, handle: UnitHandle) -> Option<&mut SimUnit> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.unit.as_mut())
    }

    /// Start the dying animation: the unit stays in the arena until collected
    pub fn kill(&mut self, handle: UnitHandle) {
        if let Some(unit) = self.get_mut(handle) {
            unit.hp = 0;
            unit.order = OrderKind::Die;
        }
    }

    pub fn destroy(&mut self, handle: UnitHandle) {
        if let Some(unit) = self.get_mut(handle) {
            unit.destroyed = true;
        }
    }

    pub fn refs(&self, handle: UnitHandle) -> u32 {
        self.get(handle).map(|u| u.refs).unwrap_or(0)
    }

    pub fn set_available(&mut self, player: PlayerId, types: impl IntoIterator<Item = UnitTypeId>) {
        self.availability.insert(player, types.into_iter().collect());
    }

    pub fn set_start_position(&mut self, player: PlayerId, position: TilePos) {
        self.start_positions.insert(player, position);
    }

    /// Free every dead unit that is no longer referenced
    ///
    /// Returns the number of slots recycled.
    pub fn collect_garbage(&mut self) -> usize {
        let mut freed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let collectable = slot.unit.as_ref().is_some_and(|u| {
                let dead = u.destroyed || u.hp == 0 || u.order == OrderKind::Die;
                dead && u.refs == 0
            });
            if collectable {
                slot.unit = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free_slots.push(index as u32);
                freed += 1;
            }
        }
        if freed > 0 {
            tracing::debug!("Collected {} dead units", freed);
        }
        freed
    }

    /// Number of units currently held in the arena
    pub fn unit_count(&self) -> usize {
        self.slots.iter().filter(|s| s.unit.is_some()).count()
    }
}

impl UnitTypeRules for SimWorld {
    fn type_count(&self) -> usize {
        self.catalog.len()
    }

    fn type_info(&self, id: UnitTypeId) -> Option<&UnitTypeInfo> {
        self.catalog.get(id)
    }

    fn is_available(&self, player: PlayerId, id: UnitTypeId) -> bool {
        match self.availability.get(&player) {
            Some(allowed) => allowed.contains(&id),
            None => id.index() < self.catalog.len(),
        }
    }
}

impl UnitWorld for SimWorld {
    fn unit_status(&self, unit: UnitHandle) -> Option<UnitStatus> {
        self.get(unit).map(|u| UnitStatus {
            unit_type: u.unit_type,
            hp: u.hp,
            destroyed: u.destroyed,
            order: u.order,
            active: u.active,
            position: u.position,
        })
    }

    fn player_units(&self, player: PlayerId) -> Vec<UnitHandle> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let unit = slot.unit.as_ref()?;
                (unit.owner == player && !unit.destroyed)
                    .then(|| UnitHandle::new(index as u32, slot.generation))
            })
            .collect()
    }

    fn start_position(&self, player: PlayerId) -> TilePos {
        self.start_positions.get(&player).copied().unwrap_or_default()
    }

    fn refs_increase(&mut self, unit: UnitHandle) {
        if let Some(u) = self.get_mut(unit) {
            u.refs += 1;
        }
    }

    fn refs_decrease(&mut self, unit: UnitHandle) {
        match self.get_mut(unit) {
            Some(u) if u.refs > 0 => u.refs -= 1,
            Some(_) => tracing::warn!("Ref count underflow on {}", unit),
            None => tracing::warn!("Ref count decrease on stale handle {}", unit),
        }
    }
}

impl OrderSink for SimWorld {
    fn command_move(&mut self, unit: UnitHandle, to: TilePos) {
        if let Some(u) = self.get_mut(unit) {
            u.order = OrderKind::Move;
        }
        self.order_log.push(IssuedOrder::Move { unit, to });
    }

    fn command_attack(&mut self, unit: UnitHandle, at: TilePos, target: Option<UnitHandle>) {
        if let Some(u) = self.get_mut(unit) {
            u.order = OrderKind::Attack;
        }
        self.order_log.push(IssuedOrder::Attack { unit, at, target });
    }

    fn request_defense(&mut self, player: PlayerId, at: TilePos) {
        self.defense_requests.push((player, at));
    }
}
