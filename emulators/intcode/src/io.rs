//! Input and output ports the machine talks to.
//!
//! Input is a blocking pull, output an append-only push. Both report a
//! disconnected peer as [`Disconnected`], which the machine turns into a fault.

use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, Sender, SyncSender};

/// The other end of a port has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disconnected;

pub trait Input {
    /// Block until the next value is available.
    fn pull(&mut self) -> Result<i64, Disconnected>;
}

pub trait Output {
    fn push(&mut self, value: i64) -> Result<(), Disconnected>;
}

/// An input port with nothing on it; every pull is a disconnect.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInput;

impl Input for NoInput {
    fn pull(&mut self) -> Result<i64, Disconnected> {
        Err(Disconnected)
    }
}

/// A preloaded queue. Once drained no more values can ever arrive, so it
/// reports a disconnect rather than blocking forever.
impl Input for VecDeque<i64> {
    fn pull(&mut self) -> Result<i64, Disconnected> {
        self.pop_front().ok_or(Disconnected)
    }
}

impl Input for Receiver<i64> {
    fn pull(&mut self) -> Result<i64, Disconnected> {
        self.recv().map_err(|_| Disconnected)
    }
}

impl<T: Input + ?Sized> Input for &mut T {
    fn pull(&mut self) -> Result<i64, Disconnected> {
        (**self).pull()
    }
}

impl<T: Input + ?Sized> Input for Box<T> {
    fn pull(&mut self) -> Result<i64, Disconnected> {
        (**self).pull()
    }
}

/// Discard sink.
impl Output for () {
    fn push(&mut self, _value: i64) -> Result<(), Disconnected> {
        Ok(())
    }
}

impl Output for Vec<i64> {
    fn push(&mut self, value: i64) -> Result<(), Disconnected> {
        Vec::push(self, value);
        Ok(())
    }
}

impl Output for Sender<i64> {
    fn push(&mut self, value: i64) -> Result<(), Disconnected> {
        self.send(value).map_err(|_| Disconnected)
    }
}

impl Output for SyncSender<i64> {
    fn push(&mut self, value: i64) -> Result<(), Disconnected> {
        self.send(value).map_err(|_| Disconnected)
    }
}

/// An absent port discards, so one machine type covers both open-ended and
/// connected chain ends.
impl<T: Output> Output for Option<T> {
    fn push(&mut self, value: i64) -> Result<(), Disconnected> {
        match self {
            Some(port) => port.push(value),
            None => Ok(()),
        }
    }
}

impl<T: Output + ?Sized> Output for &mut T {
    fn push(&mut self, value: i64) -> Result<(), Disconnected> {
        (**self).push(value)
    }
}

impl<T: Output + ?Sized> Output for Box<T> {
    fn push(&mut self, value: i64) -> Result<(), Disconnected> {
        (**self).push(value)
    }
}
