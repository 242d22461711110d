/// Event pump - forwards window events to the renderer
///
/// The windowing layer pushes `WindowEvent`s into an `EventQueue` from the
/// main thread. A dedicated thread drains the queue at a fixed rate:
/// resizes go straight to the renderer's `ResizeHandle`, while quit and
/// recreate requests are latched and picked up again by the main thread,
/// which owns the window and therefore the renderer lifecycle.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::clock::pacing_delay;
use crate::error::{Error, Result};
use crate::renderer::ResizeHandle;
use crate::{engine_debug, engine_info, engine_trace};

/// Events the windowing layer hands to the pump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    /// Drawable area changed (0x0 when minimized)
    Resized { width: u32, height: u32 },
    CloseRequested,
    /// Tear the renderer down and build it again on a new device
    RecreateRequested,
}

/// FIFO of pending window events, shared between producer and pump
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Mutex<VecDeque<WindowEvent>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: WindowEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push_back(event),
            Err(poisoned) => poisoned.into_inner().push_back(event),
        }
    }

    /// Take every queued event, oldest first
    pub fn pop_all(&self) -> Vec<WindowEvent> {
        let mut events = match self.events.lock() {
            Ok(events) => events,
            Err(poisoned) => poisoned.into_inner(),
        };
        events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventPumpConfig {
    /// Upper bound on queue drains per second
    pub max_pumps_per_second: u32,
}

impl Default for EventPumpConfig {
    fn default() -> Self {
        Self { max_pumps_per_second: 2000 }
    }
}

#[derive(Default)]
struct PumpFlags {
    running: AtomicBool,
    quit: AtomicBool,
    recreate: AtomicBool,
}

pub struct EventPump {
    queue: Arc<EventQueue>,
    flags: Arc<PumpFlags>,
    thread: Option<JoinHandle<()>>,
}

impl EventPump {
    /// Start the pump thread, forwarding resizes to `resize`
    pub fn spawn(config: EventPumpConfig, resize: ResizeHandle) -> Result<Self> {
        if config.max_pumps_per_second == 0 {
            return Err(Error::InvalidState("max_pumps_per_second must be > 0".to_string()));
        }

        let queue = Arc::new(EventQueue::new());
        let flags = Arc::new(PumpFlags::default());
        flags.running.store(true, Ordering::Release);

        let thread_queue = Arc::clone(&queue);
        let thread_flags = Arc::clone(&flags);
        let thread = thread::Builder::new()
            .name("ise-events".to_string())
            .spawn(move || pump_loop(config, thread_queue, thread_flags, resize))
            .map_err(|err| Error::InitializationFailed(format!("failed to spawn event thread: {}", err)))?;

        engine_info!("ise::EventPump", "Event pump started ({} pumps/s)", config.max_pumps_per_second);
        Ok(Self { queue, flags, thread: Some(thread) })
    }

    /// Queue an event for the pump thread
    pub fn push(&self, event: WindowEvent) {
        self.queue.push(event);
    }

    /// Shared queue, for producers that outlive a borrow of the pump
    pub fn queue(&self) -> Arc<EventQueue> {
        Arc::clone(&self.queue)
    }

    /// Consume a pending quit request
    pub fn take_quit_request(&self) -> bool {
        self.flags.quit.swap(false, Ordering::AcqRel)
    }

    /// Consume a pending recreate request
    pub fn take_recreate_request(&self) -> bool {
        self.flags.recreate.swap(false, Ordering::AcqRel)
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some() && self.flags.running.load(Ordering::Acquire)
    }

    /// Stop the pump thread and wait for it; events still queued are dropped
    pub fn shutdown(&mut self) {
        self.flags.running.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                engine_debug!("ise::EventPump", "Event thread panicked");
            }
            engine_info!("ise::EventPump", "Event pump stopped");
        }
    }
}

impl Drop for EventPump {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn pump_loop(config: EventPumpConfig, queue: Arc<EventQueue>, flags: Arc<PumpFlags>, resize: ResizeHandle) {
    while flags.running.load(Ordering::Acquire) {
        let pump_start = Instant::now();

        for event in queue.pop_all() {
            match event {
                WindowEvent::Resized { width, height } => {
                    engine_trace!("ise::EventPump", "Window resized to {}x{}", width, height);
                    resize.notify();
                }
                WindowEvent::CloseRequested => flags.quit.store(true, Ordering::Release),
                WindowEvent::RecreateRequested => flags.recreate.store(true, Ordering::Release),
            }
        }

        if let Some(delay) = pacing_delay(config.max_pumps_per_second, pump_start.elapsed()) {
            thread::sleep(delay);
        }
    }
}

#[cfg(test)]
#[path = "event_pump_tests.rs"]
mod tests;
