/*!
    Viewer events.

    Whatever displays frames reports pointer and key input as [`ViewerEvent`]s
    over a channel; the capture loop drains the channel between frames.
*/

use std::str::FromStr;

use crossbeam_channel::{Receiver, Sender, TryRecvError};

/// Key code of the escape key.
pub const KEY_ESCAPE: u32 = 27;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Move,
    Click,
}

/**
    A pointer event in image coordinates.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: usize,
    pub y: usize,
}

impl PointerEvent {
    pub fn moved(x: usize, y: usize) -> Self {
        Self {
            kind: PointerKind::Move,
            x,
            y,
        }
    }
}

impl FromStr for PointerEvent {
    type Err = String;

    /// Parses `X,Y` as a pointer move and `X,Y,click` as a click.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',').map(str::trim);
        let (Some(x), Some(y)) = (parts.next(), parts.next()) else {
            return Err(format!("expected X,Y, got '{s}'"));
        };
        let kind = match parts.next() {
            None | Some("move") => PointerKind::Move,
            Some("click") => PointerKind::Click,
            Some(other) => return Err(format!("unknown pointer event '{other}'")),
        };
        if parts.next().is_some() {
            return Err(format!("expected X,Y[,click], got '{s}'"));
        }
        Ok(Self {
            kind,
            x: x.parse().map_err(|e| format!("bad x '{x}': {e}"))?,
            y: y.parse().map_err(|e| format!("bad y '{y}': {e}"))?,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerEvent {
    Pointer(PointerEvent),
    Key(u32),
    Quit,
}

pub fn channel() -> (Sender<ViewerEvent>, Receiver<ViewerEvent>) {
    crossbeam_channel::unbounded()
}

/**
    Pointer position and stop request accumulated from viewer events.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewerState {
    pub pointer: Option<PointerEvent>,
    pub stop: bool,
}

impl ViewerState {
    /**
        Apply every pending event without blocking.

        The latest pointer event wins. Escape or quit requests a stop.
    */
    pub fn drain(&mut self, events: &Receiver<ViewerEvent>) {
        loop {
            match events.try_recv() {
                Ok(event) => self.apply(event),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
    }

    pub fn apply(&mut self, event: ViewerEvent) {
        match event {
            ViewerEvent::Pointer(pointer) => self.pointer = Some(pointer),
            ViewerEvent::Key(KEY_ESCAPE) | ViewerEvent::Quit => self.stop = true,
            ViewerEvent::Key(code) => tracing::debug!(code, "ignoring key"),
        }
    }
}
