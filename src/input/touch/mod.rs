//! Touch input: gesture zones on a touch surface
//!
//! A [`TouchSurface`] owns a fixed number of zones. Each zone has an optional
//! rectangle and its own [`GestureRecognizer`]. A new contact is claimed by
//! the first idle zone that contains it; every later event for that contact
//! is routed by id.

pub mod recognizer;
pub mod tracker;


use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::GestureConfig;
use crate::pool::{Arena, Handle};
pub use recognizer::GestureRecognizer;
pub use tracker::{ContactTracker, Release, TouchEvent};

/// Axis-aligned screen rectangle (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

/// Named region with its own recognizer
#[derive(Debug, Clone)]
pub struct TouchZone {
    pub name: String,
    pub rect: Option<Rect>,
    pub config: GestureConfig,
    pub recognizer: GestureRecognizer,
}

impl TouchZone {
    fn accepts(&self, pos: Vec2) -> bool {
        self.recognizer.can_accept() && self.rect.map_or(true, |r| r.contains(pos))
    }
}

#[derive(Debug, Clone)]
pub struct TouchSurface {
    zones: Arena<TouchZone>,
}

impl TouchSurface {
    pub fn new(max_zones: usize) -> Self {
        Self {
            zones: Arena::with_capacity(max_zones),
        }
    }

    /// Add a zone; `None` when the surface is full
    pub fn add_zone(&mut self, name: impl Into<String>, rect: Option<Rect>, config: GestureConfig) -> Option<Handle> {
        let name = name.into();
        let handle = self.zones.insert(TouchZone {
            name: name.clone(),
            rect,
            config,
            recognizer: GestureRecognizer::new(),
        });
        match handle {
            Some(h) => debug!("Touch zone '{}' added as {}", name, h),
            None => debug!("Touch zone '{}' dropped: surface full", name),
        }
        handle
    }

    pub fn remove_zone(&mut self, handle: Handle) -> Option<TouchZone> {
        self.zones.remove(handle)
    }

    pub fn zone(&self, handle: Handle) -> Option<&TouchZone> {
        self.zones.get(handle)
    }

    pub fn zone_mut(&mut self, handle: Handle) -> Option<&mut TouchZone> {
        self.zones.get_mut(handle)
    }

    pub fn find(&self, name: &str) -> Option<Handle> {
        self.zones.iter().find(|(_, z)| z.name == name).map(|(h, _)| h)
    }

    pub fn zone_by_name(&self, name: &str) -> Option<&TouchZone> {
        self.zones.iter().find(|(_, z)| z.name == name).map(|(_, z)| z)
    }

    pub fn zone_by_name_mut(&mut self, name: &str) -> Option<&mut TouchZone> {
        let handle = self.find(name)?;
        self.zones.get_mut(handle)
    }

    pub fn recognizer(&self, name: &str) -> Option<&GestureRecognizer> {
        self.zone_by_name(name).map(|z| &z.recognizer)
    }

    pub fn zones(&self) -> impl Iterator<Item = (Handle, &TouchZone)> {
        self.zones.iter()
    }

    /// Route a raw event; returns the zone that took it
    pub fn handle_event(&mut self, event: TouchEvent) -> Option<Handle> {
        if let TouchEvent::Start { id, pos, .. } = event {
            let target = self.zones.iter().find(|(_, z)| z.accepts(pos)).map(|(h, _)| h);
            match target.and_then(|h| self.zones.get_mut(h).map(|z| (h, z))) {
                Some((h, zone)) => {
                    zone.recognizer.stage(event);
                    return Some(h);
                }
                None => {
                    trace!("Contact {} at {:?} not claimed by any zone", id, pos);
                    return None;
                }
            }
        }

        for (handle, zone) in self.zones.iter_mut() {
            if zone.recognizer.stage(event) {
                return Some(handle);
            }
        }
        None
    }

    /// Commit all zones for this tick
    pub fn update(&mut self, dt: f32) {
        for (_, zone) in self.zones.iter_mut() {
            zone.recognizer.update(dt, &zone.config);
        }
    }

    pub fn reset(&mut self) {
        for (_, zone) in self.zones.iter_mut() {
            zone.recognizer.reset();
        }
    }
}
