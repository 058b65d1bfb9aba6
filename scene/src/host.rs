//! Host-facing scene table: opaque [`SceneHandle`]s, stable [`Status`] codes.
//!
//! Handles are slot+generation pairs, so a handle to a destroyed scene is detected and
//! reported as [`SceneError::InvalidHandle`] rather than reaching a reused slot.

use crossbeam_channel::Receiver;
use relay_shared::{EventBatch, MarshalError, Vec3};

use crate::config::SceneConfig;
use crate::error::SceneError;
use crate::scene::Scene;

/// Opaque scene handle: upper 32 bits slot index, lower 32 bits generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SceneHandle(u64);

impl SceneHandle {
    fn new(slot: u32, generation: u32) -> Self {
        Self(((slot as u64) << 32) | generation as u64)
    }

    fn slot(self) -> usize {
        (self.0 >> 32) as usize
    }

    fn generation(self) -> u32 {
        self.0 as u32
    }

    pub fn to_raw(self) -> u64 {
        self.0
    }

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot+generation table with a free list.
struct HandleTable<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> HandleTable<T> {
    const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    fn insert(&mut self, value: T) -> SceneHandle {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return SceneHandle::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        SceneHandle::new(index, 0)
    }

    fn get(&self, handle: SceneHandle) -> Option<&T> {
        let slot = self.slots.get(handle.slot())?;
        (slot.generation == handle.generation())
            .then_some(slot.value.as_ref())
            .flatten()
    }

    fn get_mut(&mut self, handle: SceneHandle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.slot())?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.value.as_mut()
    }

    fn remove(&mut self, handle: SceneHandle) -> Option<T> {
        let slot = self.slots.get_mut(handle.slot())?;
        if slot.generation != handle.generation() {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        // A wrapped generation could revive stale handles; retire the slot instead.
        if slot.generation != 0 {
            self.free.push(handle.slot() as u32);
        }
        Some(value)
    }

    fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.value.is_some()).count()
    }
}

/// Stable status code for every boundary outcome. `Ok` is zero, failures are negative.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Ok = 0,
    InvalidHandle = -1,
    UnresolvedIdentifier = -2,
    DuplicateIdentifier = -3,
    UnknownIdentifier = -4,
    StepAlreadyInFlight = -5,
    SceneBusy = -6,
    NoStepInFlight = -7,
    CookingFailed = -8,
    InvalidArgument = -9,
    ShapeNotOnActor = -10,
    /// Step workers could not be started or went away.
    WorkerFailure = -11,
}

impl From<&SceneError> for Status {
    fn from(err: &SceneError) -> Self {
        match err {
            SceneError::Marshal(MarshalError::UnresolvedIdentifier { .. }) => {
                Status::UnresolvedIdentifier
            }
            SceneError::Marshal(MarshalError::DuplicateIdentifier { .. }) => {
                Status::DuplicateIdentifier
            }
            SceneError::Marshal(MarshalError::UnknownIdentifier { .. }) => {
                Status::UnknownIdentifier
            }
            SceneError::StepAlreadyInFlight => Status::StepAlreadyInFlight,
            SceneError::SceneBusy => Status::SceneBusy,
            SceneError::NoStepInFlight => Status::NoStepInFlight,
            SceneError::CookingFailed(_) => Status::CookingFailed,
            SceneError::InvalidArgument(_) => Status::InvalidArgument,
            SceneError::ShapeNotOnActor(..) => Status::ShapeNotOnActor,
            SceneError::InvalidHandle => Status::InvalidHandle,
            SceneError::WorkerSpawn(_) | SceneError::WorkerDisconnected => Status::WorkerFailure,
        }
    }
}

impl<T> From<&Result<T, SceneError>> for Status {
    fn from(result: &Result<T, SceneError>) -> Self {
        match result {
            Ok(_) => Status::Ok,
            Err(err) => err.into(),
        }
    }
}

struct HostedScene {
    scene: Scene,
    /// Present when the host owns the event channel.
    events: Option<Receiver<EventBatch>>,
}

/// Owns every scene created through it.
pub struct SceneHost {
    scenes: HandleTable<HostedScene>,
}

impl Default for SceneHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneHost {
    pub const fn new() -> Self {
        Self {
            scenes: HandleTable::new(),
        }
    }

    /// Create a scene with default policies whose events are queued for [`Self::drain_events`].
    pub fn create_scene(&mut self, gravity: Vec3, worker_count: usize) -> Result<SceneHandle, SceneError> {
        let config = SceneConfig::default()
            .with_gravity(gravity)
            .with_worker_count(worker_count);
        let (scene, events) = Scene::with_channel(config)?;
        Ok(self.scenes.insert(HostedScene {
            scene,
            events: Some(events),
        }))
    }

    /// Adopt an already-built scene, e.g. one delivering to its own sink.
    pub fn insert_scene(&mut self, scene: Scene) -> SceneHandle {
        self.scenes.insert(HostedScene {
            scene,
            events: None,
        })
    }

    /// Destroy a scene, joining its step workers. Destroying twice is a no-op.
    pub fn destroy_scene(&mut self, handle: SceneHandle) -> bool {
        match self.scenes.remove(handle) {
            Some(hosted) => {
                log::info!("scene {:#x} destroyed", handle.to_raw());
                drop(hosted);
                true
            }
            None => false,
        }
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    pub fn scene(&self, handle: SceneHandle) -> Result<&Scene, SceneError> {
        self.scenes
            .get(handle)
            .map(|hosted| &hosted.scene)
            .ok_or(SceneError::InvalidHandle)
    }

    pub fn scene_mut(&mut self, handle: SceneHandle) -> Result<&mut Scene, SceneError> {
        self.scenes
            .get_mut(handle)
            .map(|hosted| &mut hosted.scene)
            .ok_or(SceneError::InvalidHandle)
    }

    pub fn simulate(&mut self, handle: SceneHandle, dt: f32) -> Result<(), SceneError> {
        self.scene_mut(handle)?.simulate(dt)
    }

    pub fn collide(&mut self, handle: SceneHandle, dt: f32) -> Result<(), SceneError> {
        self.scene_mut(handle)?.collide(dt)
    }

    pub fn fetch_results(&mut self, handle: SceneHandle, block: bool) -> Result<bool, SceneError> {
        self.scene_mut(handle)?.fetch_results(block)
    }

    pub fn gravity(&self, handle: SceneHandle) -> Result<Vec3, SceneError> {
        self.scene(handle)?.gravity()
    }

    pub fn set_gravity(&mut self, handle: SceneHandle, gravity: Vec3) -> Result<(), SceneError> {
        self.scene_mut(handle)?.set_gravity(gravity)
    }

    /// Take every batch flushed so far, oldest first. Empty for adopted scenes.
    pub fn drain_events(&self, handle: SceneHandle) -> Result<Vec<EventBatch>, SceneError> {
        let hosted = self.scenes.get(handle).ok_or(SceneError::InvalidHandle)?;
        Ok(hosted
            .events
            .as_ref()
            .map(|rx| rx.try_iter().collect())
            .unwrap_or_default())
    }
}
