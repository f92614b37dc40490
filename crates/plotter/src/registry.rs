use std::{cell::RefCell, rc::Rc, sync::Arc};

use crossbeam::channel::{unbounded, Receiver, Sender};
use geometry::Viewport;
use parking_lot::RwLock;
use smallvec::SmallVec;
use structures::{Arena, Handle};

use crate::graphic::{Graphic, SharedGraphic};

pub(crate) struct Entry {
    pub(crate) graphic: SharedGraphic,
    /// Where the graphic was last drawn, or `None` if it has never been drawn.
    pub(crate) drawn_at: Option<Viewport>,
}

/// Interrupts whatever the render thread is blocked on so that it draws
/// another frame. Called from the submitting thread.
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// Stable identifier of a graphic in a [`Registry`]. Stays valid until that
/// graphic is removed, regardless of what else is added or removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GraphicId(Handle<Entry>);

/// The graphics of a scene, in draw order.
///
/// Graphics appended later are drawn on top of graphics appended earlier.
pub struct Registry {
    entries: Arena<Entry>,
    order: Vec<Handle<Entry>>,
    /// Regions left behind by removed graphics that have not been repainted.
    vacated: SmallVec<[Viewport; 4]>,
    remote_tx: Sender<Box<dyn Graphic + Send>>,
    remote_rx: Receiver<Box<dyn Graphic + Send>>,
    waker: Arc<RwLock<Option<Waker>>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        let (remote_tx, remote_rx) = unbounded();
        Self {
            entries: Arena::new(),
            order: Vec::new(),
            vacated: SmallVec::new(),
            remote_tx,
            remote_rx,
            waker: Arc::default(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Adds a graphic on top of all others. The graphic is not touched until
    /// the next frame.
    pub fn append(&mut self, graphic: SharedGraphic) -> GraphicId {
        let handle = self.entries.insert(Entry {
            graphic,
            drawn_at: None,
        });
        self.order.push(handle);
        GraphicId(handle)
    }

    /// Removes a graphic from the scene. The region it was last drawn in is
    /// repainted on the next frame.
    ///
    /// Returns `None` if the graphic was already removed.
    pub fn remove(&mut self, id: GraphicId) -> Option<SharedGraphic> {
        let entry = self.entries.remove(id.0)?;
        self.order.retain(|handle| *handle != id.0);

        if let Some(viewport) = entry.drawn_at {
            self.vacated.push(viewport);
        }

        Some(entry.graphic)
    }

    #[must_use]
    pub fn get(&self, id: GraphicId) -> Option<&SharedGraphic> {
        self.entries.get(id.0).map(|entry| &entry.graphic)
    }

    #[must_use]
    pub fn contains(&self, id: GraphicId) -> bool {
        self.entries.contains(id.0)
    }

    /// Iterates over the graphics in draw order, bottom first.
    pub fn iter(&self) -> impl Iterator<Item = (GraphicId, &SharedGraphic)> + '_ {
        self.order.iter().filter_map(|handle| {
            self.entries
                .get(*handle)
                .map(|entry| (GraphicId(*handle), &entry.graphic))
        })
    }

    /// Returns a handle that other threads can use to add graphics. They are
    /// appended at the start of the next frame.
    #[must_use]
    pub fn registrar(&self) -> RemoteRegistrar {
        RemoteRegistrar {
            tx: self.remote_tx.clone(),
            waker: self.waker.clone(),
        }
    }

    /// Sets the callback every [`RemoteRegistrar`] of this registry invokes
    /// after a submission, including registrars created earlier.
    pub fn set_waker(&self, waker: Waker) {
        *self.waker.write() = Some(waker);
    }

    /// Appends every graphic submitted through a [`RemoteRegistrar`] since the
    /// last call, in submission order.
    pub(crate) fn drain_remote(&mut self) -> usize {
        let mut count = 0;
        while let Ok(graphic) = self.remote_rx.try_recv() {
            let graphic: SharedGraphic = Rc::new(RefCell::new(graphic));
            self.append(graphic);
            count += 1;
        }
        count
    }

    pub(crate) fn take_vacated(&mut self) -> SmallVec<[Viewport; 4]> {
        std::mem::take(&mut self.vacated)
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.order
            .iter()
            .filter_map(|handle| self.entries.get(*handle))
    }

    pub(crate) fn entry_at_mut(&mut self, position: usize) -> Option<&mut Entry> {
        let handle = *self.order.get(position)?;
        self.entries.get_mut(handle)
    }
}

/// Thread-safe handle for adding graphics to a [`Registry`] from other
/// threads.
#[derive(Clone)]
pub struct RemoteRegistrar {
    tx: Sender<Box<dyn Graphic + Send>>,
    waker: Arc<RwLock<Option<Waker>>>,
}

impl RemoteRegistrar {
    /// Queues a graphic to be appended at the start of the next frame and
    /// wakes the render thread if it is waiting for events.
    ///
    /// Returns the graphic if the registry has been dropped.
    pub fn submit(
        &self,
        graphic: Box<dyn Graphic + Send>,
    ) -> Result<(), Box<dyn Graphic + Send>> {
        self.tx.send(graphic).map_err(|e| e.into_inner())?;

        if let Some(wake) = self.waker.read().as_ref() {
            wake();
        }

        Ok(())
    }
}
