//! Application state and the reducer that applies input messages to it.
//!
//! All mutation goes through [`ApplicationState::apply`], one message at a
//! time. [`SharedState`] wraps the state in a single reader/writer lock:
//! writers hold it for exactly one reduce step, readers copy a
//! [`StateSnapshot`] out and release it before doing anything else.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use math::vec::{Vec2i, Vec3};

use crate::camera::OrbitCamera;

/// Mouse travel, in pixels, that turns the camera by one radian.
pub const DRAG_PIXELS_PER_RADIAN: f32 = 50.0;

/// Water shading parameters, passed to the renderer unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Water {
    pub reflectivity: f32,
    pub fresnel_strength: f32,
    pub wave_speed: f32,
    pub use_reflection: bool,
    pub use_refraction: bool,
}

impl Default for Water {
    fn default() -> Self {
        Self {
            reflectivity: 0.6,
            fresnel_strength: 2.0,
            wave_speed: 0.03,
            use_reflection: true,
            use_refraction: true,
        }
    }
}

impl Water {
    /// Offset into the dudv distortion texture at `clock_ms`.
    pub fn dudv_offset(&self, clock_ms: f32) -> f32 {
        (clock_ms / 1000.0) * self.wave_speed
    }
}

/// Last known pointer position and button state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Mouse {
    pub position: Vec2i,
    pub pressed: bool,
}

/// A discrete input event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// Advance the clock by `dt` milliseconds.
    AdvanceClock { dt: f32 },
    MouseDown { x: i32, y: i32 },
    MouseUp,
    MouseMove { x: i32, y: i32 },
    Zoom { delta: f32 },
    SetReflectivity(f32),
    SetFresnel(f32),
    SetWaveSpeed(f32),
    UseReflection(bool),
    UseRefraction(bool),
    ShowScenery(bool),
    /// Anything the input layer could not map. Applying it is a no-op.
    Unrecognized(String),
}

/// Value of a named property-set event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Float(f32),
}

impl Message {
    /// Maps a named property-set event to its message. Unknown names and
    /// values of the wrong kind become [`Message::Unrecognized`].
    pub fn set_property(name: &str, value: PropertyValue) -> Message {
        match (name, value) {
            ("reflectivity", PropertyValue::Float(v)) => Message::SetReflectivity(v),
            ("fresnelStrength", PropertyValue::Float(v)) => Message::SetFresnel(v),
            ("waveSpeed", PropertyValue::Float(v)) => Message::SetWaveSpeed(v),
            ("useReflection", PropertyValue::Bool(v)) => Message::UseReflection(v),
            ("useRefraction", PropertyValue::Bool(v)) => Message::UseRefraction(v),
            ("showScenery", PropertyValue::Bool(v)) => Message::ShowScenery(v),
            _ => Message::Unrecognized(format!("{name}={value:?}")),
        }
    }
}

/// Partial update of the water properties; absent fields stay unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WaterUpdate {
    pub reflectivity: Option<f32>,
    pub fresnel_strength: Option<f32>,
    pub wave_speed: Option<f32>,
    pub use_reflection: Option<bool>,
    pub use_refraction: Option<bool>,
}

impl WaterUpdate {
    pub fn into_messages(self) -> Vec<Message> {
        let mut messages = Vec::new();
        if let Some(v) = self.reflectivity {
            messages.push(Message::SetReflectivity(v));
        }
        if let Some(v) = self.fresnel_strength {
            messages.push(Message::SetFresnel(v));
        }
        if let Some(v) = self.wave_speed {
            messages.push(Message::SetWaveSpeed(v));
        }
        if let Some(v) = self.use_reflection {
            messages.push(Message::UseReflection(v));
        }
        if let Some(v) = self.use_refraction {
            messages.push(Message::UseRefraction(v));
        }
        messages
    }
}

/// Values copied out of the state for serialization or streaming.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub clock: f32,
    pub scenery: bool,
    pub camera_position: Vec3,
    /// Column-major, in the order the graphics API expects.
    pub view_matrix: [f32; 16],
    pub water: Water,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationState {
    clock: f32,
    camera: OrbitCamera,
    mouse: Mouse,
    water: Water,
    scenery: bool,
}

impl Default for ApplicationState {
    fn default() -> Self {
        ApplicationState::new(OrbitCamera::default(), Water::default())
    }
}

impl ApplicationState {
    pub fn new(camera: OrbitCamera, water: Water) -> Self {
        Self {
            clock: 0.0,
            camera,
            mouse: Mouse::default(),
            water,
            scenery: true,
        }
    }

    /// Milliseconds accumulated from clock messages.
    pub fn clock(&self) -> f32 {
        self.clock
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn mouse(&self) -> Mouse {
        self.mouse
    }

    pub fn water(&self) -> Water {
        self.water
    }

    pub fn scenery(&self) -> bool {
        self.scenery
    }

    /// Applies one message. Never fails, unknown messages are ignored.
    pub fn apply(&mut self, message: &Message) {
        log::trace!("apply {:?}", message);

        match *message {
            Message::AdvanceClock { dt } => self.clock += dt,
            Message::MouseDown { x, y } => {
                self.mouse.pressed = true;
                self.mouse.position = Vec2i::new(x, y);
            }
            Message::MouseUp => self.mouse.pressed = false,
            Message::MouseMove { x, y } => {
                if !self.mouse.pressed {
                    return;
                }
                // f32 so far-apart positions can't overflow the subtraction
                let last = self.mouse.position;
                let yaw_delta = (last.x as f32 - x as f32) / DRAG_PIXELS_PER_RADIAN;
                let pitch_delta = (y as f32 - last.y as f32) / DRAG_PIXELS_PER_RADIAN;

                self.camera.orbit_left_right(yaw_delta);
                self.camera.orbit_up_down(pitch_delta);
                self.mouse.position = Vec2i::new(x, y);
            }
            Message::Zoom { delta } => self.camera.zoom(delta),
            Message::SetReflectivity(v) => self.water.reflectivity = v,
            Message::SetFresnel(v) => self.water.fresnel_strength = v,
            Message::SetWaveSpeed(v) => self.water.wave_speed = v,
            Message::UseReflection(v) => self.water.use_reflection = v,
            Message::UseRefraction(v) => self.water.use_refraction = v,
            Message::ShowScenery(v) => self.scenery = v,
            Message::Unrecognized(ref what) => {
                log::debug!("ignoring unrecognized message {}", what);
            }
        }
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            clock: self.clock,
            scenery: self.scenery,
            camera_position: self.camera.position(),
            view_matrix: self.camera.view().to_cols_array(),
            water: self.water,
        }
    }
}

/// Handle to the one [`ApplicationState`] of the process.
///
/// Clones share the same state. A panic while the lock is held cannot leave
/// the state half-updated in a way later readers care about, so poisoning is
/// ignored.
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<RwLock<ApplicationState>>,
}

impl SharedState {
    pub fn new(state: ApplicationState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ApplicationState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ApplicationState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `message` under the exclusive lock.
    pub fn update(&self, message: &Message) {
        self.write().apply(message);
    }

    /// Applies `messages` in order, taking the lock once per message.
    pub fn update_all<'a, I>(&self, messages: I)
    where
        I: IntoIterator<Item = &'a Message>,
    {
        for message in messages {
            self.update(message);
        }
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.read().snapshot()
    }

    pub fn camera(&self) -> OrbitCamera {
        *self.read().camera()
    }

    pub fn water(&self) -> Water {
        self.read().water()
    }

    pub fn clock(&self) -> f32 {
        self.read().clock()
    }
}
