//! Pointer-driven editing of a composition.
//!
//! [`Editor`] turns pointer down/move/up events into note creation,
//! selection, moving, resizing and box-selection, and owns the play/stop
//! trigger. Every gesture is resolved synchronously: one event is handled to
//! completion before the next one arrives, and pointer-up always returns the
//! editor to [`InteractionState::Idle`].
//!
//! The rendering surface is not called directly. Instead the editor queues
//! [`CanvasEvent`]s which the surface drains with [`Editor::take_events`].

use crate::audio::PlaybackBackend;
use crate::error::Result;
use crate::sheet::{
    build_score, is_on_sheet, Bounds, ChannelMap, Composition, DragBox, Instrument, Note, NoteId,
    ResizeEdge, Selection,
};
use crate::transport::Transport;
use tracing::{debug, info, warn};

/// What the current gesture is doing.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionState {
    /// No gesture, or a gesture that only adjusted the selection.
    Idle,
    /// Rubber-band selection. `base` is the selection kept regardless of
    /// what the box encloses (non-empty only with the modifier held).
    BoxSelecting { drag_box: DragBox, base: Vec<NoteId> },
    /// Dragging the selected notes.
    Moving,
    /// Dragging one edge of every selected note.
    Resizing { edge: ResizeEdge },
}

/// A pointer event in canvas units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// `ctrl` is the multi-select modifier.
    Down { x: f64, y: f64, ctrl: bool },
    Move { x: f64, y: f64 },
    Up { x: f64, y: f64 },
}

/// Changes the rendering surface has to reflect.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    NoteAdded(NoteId),
    NotesRemoved(Vec<NoteId>),
    /// Geometry of these notes changed.
    NotesChanged(Vec<NoteId>),
    SelectionChanged {
        selected: Vec<NoteId>,
        deselected: Vec<NoteId>,
    },
    /// The drag box appeared, grew, or (with `None`) went away.
    DragBoxChanged(Option<Bounds>),
    PlaybackStarted { stop_time: u32 },
    PlaybackStopped,
}

/// Outcome of [`Editor::toggle_playback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackAction {
    Started { stop_time: u32 },
    Stopped,
    /// Refused because a gesture is in flight.
    Deferred,
}

#[derive(Debug, Clone, Copy)]
struct Press {
    x: f64,
    y: f64,
    ctrl: bool,
    last_x: f64,
    last_y: f64,
    moved: bool,
}

pub struct Editor<B: PlaybackBackend, T: Transport> {
    composition: Composition,
    channels: ChannelMap,
    instrument: Instrument,
    state: InteractionState,
    /// The pointer-down of the gesture in flight.
    press: Option<Press>,
    events: Vec<CanvasEvent>,
    backend: B,
    transport: T,
    playing: bool,
}

impl<B: PlaybackBackend, T: Transport> Editor<B, T> {
    pub fn new(channels: ChannelMap, instrument: Instrument, backend: B, transport: T) -> Self {
        Self {
            composition: Composition::new(),
            channels,
            instrument,
            state: InteractionState::Idle,
            press: None,
            events: Vec::new(),
            backend,
            transport,
            playing: false,
        }
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> Result<()> {
        match event {
            PointerEvent::Down { x, y, ctrl } => self.pointer_down(x, y, ctrl),
            PointerEvent::Move { x, y } => self.pointer_move(x, y),
            PointerEvent::Up { x, y } => return self.pointer_up(x, y),
        }
        Ok(())
    }

    /// Starts a gesture.
    ///
    /// A press on a resize edge starts a resize, a press inside a note
    /// starts a move, and a press on empty space starts a box selection.
    /// While playback is running the press only stops it.
    pub fn pointer_down(&mut self, x: f64, y: f64, ctrl: bool) {
        if self.transport.is_active() {
            debug!(x, y, "press during playback stops it");
            self.stop();
            return;
        }
        if self.press.is_some() {
            // The previous release never arrived.
            self.abandon_gesture();
        }

        let before = self.composition.selection().ids();
        self.press = Some(Press {
            x,
            y,
            ctrl,
            last_x: x,
            last_y: y,
            moved: false,
        });

        if let Some((id, edge)) = self.composition.edge_at(x, y) {
            if self.grab(id, ctrl) {
                self.state = InteractionState::Resizing { edge };
            }
        } else if let Some(id) = self.composition.note_at(x, y) {
            if self.grab(id, ctrl) {
                self.state = InteractionState::Moving;
            }
        } else {
            if !ctrl {
                self.composition.clear_selection();
            }
            let drag_box = DragBox::new(x, y);
            self.events
                .push(CanvasEvent::DragBoxChanged(Some(drag_box.bounds())));
            self.state = InteractionState::BoxSelecting {
                drag_box,
                base: self.composition.selection().ids(),
            };
        }

        debug!(x, y, ctrl, state = ?self.state, "pointer down");
        self.push_selection_delta(&before);
    }

    /// Applies the selection adjustment of a press on a note.
    /// Returns false when the press unselected the note, in which case no
    /// drag starts.
    fn grab(&mut self, id: NoteId, ctrl: bool) -> bool {
        match (self.composition.is_selected(id), ctrl) {
            (true, true) => {
                self.composition.unselect(id);
                false
            }
            (true, false) => true,
            (false, true) => {
                self.composition.select(id);
                true
            }
            (false, false) => {
                self.composition.clear_selection();
                self.composition.select(id);
                true
            }
        }
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        let Some(press) = self.press.as_mut() else {
            return;
        };
        let (dx, dy) = (x - press.last_x, y - press.last_y);
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        press.last_x = x;
        press.last_y = y;
        press.moved = true;

        match &mut self.state {
            InteractionState::Idle => {}
            InteractionState::Moving => {
                self.composition.translate_selected(dx, dy);
                self.events
                    .push(CanvasEvent::NotesChanged(self.composition.selection().ids()));
            }
            InteractionState::Resizing { edge } => {
                self.composition.resize_selected(*edge, dx);
                self.events
                    .push(CanvasEvent::NotesChanged(self.composition.selection().ids()));
            }
            InteractionState::BoxSelecting { drag_box, base } => {
                drag_box.grow(dx, dy);
                let bounds = drag_box.bounds();
                let before = self.composition.selection().ids();
                self.composition.select_enclosed(&bounds, base);
                self.events.push(CanvasEvent::DragBoxChanged(Some(bounds)));
                if let Some(event) = selection_delta(&before, self.composition.selection()) {
                    self.events.push(event);
                }
            }
        }
    }

    /// Ends the gesture.
    ///
    /// A box selection that never moved is a click on empty space and
    /// creates a note at the press position with the active instrument's
    /// channel.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ComposerError::UnknownInstrument`] if the
    /// active instrument is missing from the channel map. The gesture is
    /// still closed and the composition left as it was.
    pub fn pointer_up(&mut self, x: f64, y: f64) -> Result<()> {
        if self.press.is_none() {
            return Ok(());
        }
        self.pointer_move(x, y);
        let Some(press) = self.press.take() else {
            return Ok(());
        };

        match std::mem::replace(&mut self.state, InteractionState::Idle) {
            InteractionState::Idle | InteractionState::Resizing { .. } => {}
            InteractionState::Moving => {
                if press.moved {
                    self.composition.snap_selected();
                    self.events
                        .push(CanvasEvent::NotesChanged(self.composition.selection().ids()));
                }
            }
            InteractionState::BoxSelecting { .. } => {
                self.events.push(CanvasEvent::DragBoxChanged(None));
                if !press.moved {
                    self.create_note(press.x, press.y, press.ctrl)?;
                }
            }
        }
        debug!(x, y, "pointer up");
        Ok(())
    }

    fn create_note(&mut self, x: f64, y: f64, ctrl: bool) -> Result<()> {
        if !is_on_sheet(y) {
            debug!(x, y, "click off the sheet ignored");
            return Ok(());
        }
        let channel = self.channels.channel_for(self.instrument)?;
        let before = self.composition.selection().ids();
        if !ctrl {
            self.composition.clear_selection();
        }
        if let Some(id) = self.composition.add_note(x, y, channel) {
            debug!(%id, x, y, channel, "note created");
            self.events.push(CanvasEvent::NoteAdded(id));
        }
        self.push_selection_delta(&before);
        Ok(())
    }

    /// Resolves a gesture whose release was lost, leaving notes on the grid.
    fn abandon_gesture(&mut self) {
        if let Some(press) = self.press.take() {
            debug!(x = press.last_x, y = press.last_y, "abandoning unfinished gesture");
        }
        match std::mem::replace(&mut self.state, InteractionState::Idle) {
            InteractionState::Moving => {
                self.composition.snap_selected();
                self.events
                    .push(CanvasEvent::NotesChanged(self.composition.selection().ids()));
            }
            InteractionState::BoxSelecting { .. } => {
                self.events.push(CanvasEvent::DragBoxChanged(None));
            }
            InteractionState::Idle | InteractionState::Resizing { .. } => {}
        }
    }

    /// Play/stop trigger.
    ///
    /// Stops while the transport is active. Otherwise builds the score from
    /// the committed notes, hands it to the backend and starts the
    /// transport, unless a gesture is in flight.
    pub fn toggle_playback(&mut self) -> PlaybackAction {
        if self.transport.is_active() {
            self.stop();
            return PlaybackAction::Stopped;
        }
        if self.press.is_some() {
            warn!(state = ?self.state, "play requested during a gesture, ignoring");
            return PlaybackAction::Deferred;
        }
        if self.playing {
            self.stop();
        }

        self.backend.stop();
        self.backend.clear();
        let score = build_score(self.composition.notes(), &self.channels);
        self.backend.load(&score);
        self.transport.start(score.stop_time);
        self.backend.play();
        self.playing = true;

        info!(
            notes = self.composition.len(),
            stop_time = score.stop_time,
            "playback started"
        );
        self.events.push(CanvasEvent::PlaybackStarted {
            stop_time: score.stop_time,
        });
        PlaybackAction::Started {
            stop_time: score.stop_time,
        }
    }

    pub fn stop(&mut self) {
        self.transport.stop();
        self.backend.stop();
        if self.playing {
            self.playing = false;
            info!("playback stopped");
            self.events.push(CanvasEvent::PlaybackStopped);
        }
    }

    /// Called once per host frame.
    pub fn update(&mut self) {
        self.backend.update();
        if self.playing && !self.transport.is_active() {
            self.stop();
        }
    }

    /// Sets the instrument used for notes created from now on.
    pub fn change_instrument(&mut self, instrument: Instrument) {
        if instrument != self.instrument {
            debug!(from = %self.instrument, to = %instrument, "instrument changed");
        }
        self.instrument = instrument;
    }

    pub fn select_all(&mut self) {
        let before = self.composition.selection().ids();
        self.composition.select_all();
        self.push_selection_delta(&before);
    }

    pub fn clear_selection(&mut self) {
        let before = self.composition.selection().ids();
        self.composition.clear_selection();
        self.push_selection_delta(&before);
    }

    /// Deletes every selected note. Returns how many were removed.
    pub fn delete_selected(&mut self) -> usize {
        let removed: Vec<NoteId> = self
            .composition
            .delete_selected()
            .into_iter()
            .map(|note| note.id)
            .collect();
        if removed.is_empty() {
            return 0;
        }
        debug!(count = removed.len(), "notes deleted");
        self.events.push(CanvasEvent::SelectionChanged {
            selected: Vec::new(),
            deselected: removed.clone(),
        });
        let count = removed.len();
        self.events.push(CanvasEvent::NotesRemoved(removed));
        count
    }

    /// Drains the queued surface events, oldest first.
    pub fn take_events(&mut self) -> Vec<CanvasEvent> {
        std::mem::take(&mut self.events)
    }

    fn push_selection_delta(&mut self, before: &[NoteId]) {
        if let Some(event) = selection_delta(before, self.composition.selection()) {
            self.events.push(event);
        }
    }

    pub fn notes(&self) -> &[Note] {
        self.composition.notes()
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    pub fn selection(&self) -> &Selection {
        self.composition.selection()
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// Bounds of the drag box while a box selection is in progress.
    pub fn drag_box(&self) -> Option<Bounds> {
        match &self.state {
            InteractionState::BoxSelecting { drag_box, .. } => Some(drag_box.bounds()),
            _ => None,
        }
    }

    pub fn is_gesture_active(&self) -> bool {
        self.press.is_some()
    }

    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    pub fn channels(&self) -> &ChannelMap {
        &self.channels
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

fn selection_delta(before: &[NoteId], after: &Selection) -> Option<CanvasEvent> {
    let selected: Vec<NoteId> = after
        .ids()
        .into_iter()
        .filter(|id| !before.contains(id))
        .collect();
    let deselected: Vec<NoteId> = before
        .iter()
        .copied()
        .filter(|id| !after.contains(*id))
        .collect();
    if selected.is_empty() && deselected.is_empty() {
        None
    } else {
        Some(CanvasEvent::SelectionChanged {
            selected,
            deselected,
        })
    }
}
