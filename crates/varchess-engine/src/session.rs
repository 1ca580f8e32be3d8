//! Game session: the record, the board and engine play.
//!
//! A [`Session`] keeps the [`GameRecord`] and the [`Board`] in step. Engine
//! searches run on a blocking worker thread against a snapshot while the
//! session's board stays locked; results come back through
//! [`Session::finish_search`]. Every state transition is announced on a
//! broadcast channel in the order it happened.

use crate::board::{Board, Phase};
use crate::catalog::VariantCatalog;
use crate::config::EngineConfig;
use crate::rules::Outcome;
use crate::search::{BestSequence, SearchEngine};
use crate::EngineError;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use varchess_core::{notation, GameRecord, Move, Side};

/// Notifications about session state changes.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A move was applied, promotion choice resolved.
    MoveApplied(Move),
    /// The last move was taken back.
    MoveUndone(Move),
    /// A game was loaded or started.
    GameLoaded(GameRecord),
    /// An engine search finished.
    SearchComplete(BestSequence),
    /// The game ended. The score is from White's point of view.
    GameOver { outcome: Outcome, final_score: i32 },
}

/// Broadcast channel sender for session events.
pub type SessionBroadcast = broadcast::Sender<SessionEvent>;

/// Cancels a running search from another task.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

struct PendingSearch {
    cancel: CancelHandle,
    handle: JoinHandle<Result<BestSequence, EngineError>>,
}

/// A game in progress.
pub struct Session {
    catalog: VariantCatalog,
    config: EngineConfig,
    record: GameRecord,
    board: Board,
    events: SessionBroadcast,
    search: Option<PendingSearch>,
}

impl Session {
    /// Starts a session on a new game with the configured defaults.
    pub fn new(catalog: VariantCatalog, config: EngineConfig) -> Result<Self, EngineError> {
        let record = GameRecord::new(
            config.default_setup.clone(),
            config.atomic,
            config.white_level,
            config.black_level,
        );
        let board = Board::new(catalog.get(&record.setup)?, record.atomic);
        let (events, _) = broadcast::channel(100);
        Ok(Session {
            catalog,
            config,
            record,
            board,
            events,
            search: None,
        })
    }

    /// Subscribes to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn record(&self) -> &GameRecord {
        &self.record
    }

    pub fn catalog(&self) -> &VariantCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns true while an engine search owns the board.
    pub fn is_searching(&self) -> bool {
        self.search.is_some()
    }

    /// Replaces the game with a fresh one, keeping the strength levels.
    pub fn new_game(&mut self, setup: &str, atomic: bool) -> Result<(), EngineError> {
        let record = GameRecord::new(setup, atomic, self.record.white_level, self.record.black_level);
        self.load_record(record)?;
        tracing::info!(setup, atomic, "new game");
        Ok(())
    }

    /// Sets the strength levels of both sides.
    pub fn set_levels(&mut self, white: u32, black: u32) {
        self.record.white_level = white;
        self.record.black_level = black;
    }

    /// Strength level of the side to move.
    pub fn level_to_move(&self) -> u32 {
        match self.board.side_to_move() {
            Side::White => self.record.white_level,
            Side::Black => self.record.black_level,
        }
    }

    /// Search depth for a strength level, `None` for a human player.
    pub fn depth_for_level(&self, level: u32) -> Option<u32> {
        self.config.depth_for_level(level)
    }

    /// Plays a move for the side to move.
    pub fn play(&mut self, mv: &Move) -> Result<Move, EngineError> {
        let applied = self.board.apply_move(mv).map_err(|e| {
            tracing::warn!(mv = %mv, error = %e, "move rejected");
            e
        })?;
        self.record.push(applied.clone());
        self.emit(SessionEvent::MoveApplied(applied.clone()));
        if let Phase::Terminal(outcome) = self.board.phase() {
            self.game_over(outcome)?;
        }
        Ok(applied)
    }

    /// Takes back the last move.
    pub fn undo(&mut self) -> Result<Move, EngineError> {
        let mv = self.board.undo_last()?;
        self.record.pop();
        self.emit(SessionEvent::MoveUndone(mv.clone()));
        Ok(mv)
    }

    /// Goes back to the position after `ply` moves, dropping later moves.
    pub fn jump(&mut self, ply: usize) -> Result<(), EngineError> {
        let applied = self.board.jump(&self.record.moves, ply)?;
        self.record.moves = applied;
        tracing::debug!(ply = self.record.len(), "jumped");
        self.emit(SessionEvent::GameLoaded(self.record.clone()));
        if let Phase::Terminal(outcome) = self.board.phase() {
            self.game_over(outcome)?;
        }
        Ok(())
    }

    /// Loads a saved game from a file.
    pub fn load(&mut self, path: &Path) -> Result<(), EngineError> {
        if self.board.is_locked() {
            return Err(EngineError::BoardLocked);
        }
        let record = notation::read_file(path, &self.catalog)?;
        self.load_record(record)?;
        tracing::info!(path = %path.display(), plies = self.record.len(), "loaded game");
        Ok(())
    }

    /// Replaces the game with `record`, replaying its moves.
    ///
    /// Nothing changes if the record names an unknown setup or contains an
    /// illegal move.
    pub fn load_record(&mut self, mut record: GameRecord) -> Result<(), EngineError> {
        if self.board.is_locked() {
            return Err(EngineError::BoardLocked);
        }
        let mut board = Board::new(self.catalog.get(&record.setup)?, record.atomic);
        record.moves = board.replay(&record.moves)?;
        self.board = board;
        self.record = record;
        self.emit(SessionEvent::GameLoaded(self.record.clone()));
        if let Phase::Terminal(outcome) = self.board.phase() {
            self.game_over(outcome)?;
        }
        Ok(())
    }

    /// Saves the game to a file.
    pub fn save(&self, path: &Path) -> Result<(), EngineError> {
        if self.board.is_locked() {
            return Err(EngineError::BoardLocked);
        }
        notation::write_file(path, &self.record)?;
        tracing::info!(path = %path.display(), plies = self.record.len(), "saved game");
        Ok(())
    }

    /// Starts an engine search on a worker thread.
    ///
    /// The board stays locked until the search is finished or cancelled.
    /// Must be called from within a tokio runtime.
    pub fn start_search(&mut self, depth: u32) -> Result<CancelHandle, EngineError> {
        if self.board.is_locked() {
            tracing::warn!("search refused: board is locked");
            return Err(EngineError::BoardLocked);
        }
        let engine = SearchEngine::new(depth)?;
        let snapshot = self.board.snapshot();
        let cancel = CancelHandle(Arc::new(AtomicBool::new(false)));
        let flag = cancel.0.clone();
        let handle = tokio::task::spawn_blocking(move || {
            engine.best_sequence_cancellable(&snapshot, &flag)
        });
        self.board.lock();
        self.search = Some(PendingSearch {
            cancel: cancel.clone(),
            handle,
        });
        tracing::debug!(depth, ply = self.board.ply(), "search started");
        Ok(cancel)
    }

    /// Waits for the running search and releases the board.
    ///
    /// Returns [`EngineError::SearchCancelled`] if no search is running or
    /// the search was cancelled, and [`EngineError::SearchFailed`] if the
    /// worker panicked.
    ///
    /// Dropping the returned future before it completes leaves the search
    /// running and the board locked, so it can still be finished or
    /// cancelled later.
    pub async fn finish_search(&mut self) -> Result<BestSequence, EngineError> {
        let pending = self.search.as_mut().ok_or(EngineError::SearchCancelled)?;
        let joined = (&mut pending.handle).await;
        let Some(pending) = self.search.take() else {
            return Err(EngineError::SearchCancelled);
        };
        self.board.unlock();

        let result = joined.unwrap_or_else(|e| {
            tracing::error!(error = %e, "search worker failed");
            Err(EngineError::SearchFailed(e.to_string()))
        });

        let result = match result {
            Ok(_) if pending.cancel.is_cancelled() => Err(EngineError::SearchCancelled),
            other => other,
        };
        match &result {
            Ok(seq) => {
                tracing::info!(score = seq.score, line = ?seq.moves, "search complete");
                self.emit(SessionEvent::SearchComplete(seq.clone()));
            }
            Err(e) => tracing::warn!(error = %e, "search discarded"),
        }
        result
    }

    /// Cancels the running search, if any, and releases the board at once.
    ///
    /// The worker's result is discarded. Returns true if a search was
    /// running.
    pub fn cancel_search(&mut self) -> bool {
        match self.search.take() {
            Some(pending) => {
                pending.cancel.cancel();
                self.board.unlock();
                tracing::warn!("search cancelled");
                true
            }
            None => false,
        }
    }

    /// Searches the current position to `depth` plies.
    pub async fn think(&mut self, depth: u32) -> Result<BestSequence, EngineError> {
        self.start_search(depth)?;
        self.finish_search().await
    }

    /// Lets the engine play for the side to move at that side's level.
    ///
    /// Returns `None` if the side to move is human or the game is over.
    pub async fn play_engine_move(&mut self) -> Result<Option<Move>, EngineError> {
        if self.board.phase().is_terminal() {
            return Ok(None);
        }
        let Some(depth) = self.depth_for_level(self.level_to_move()) else {
            return Ok(None);
        };
        let seq = self.think(depth).await?;
        match seq.best_move().cloned() {
            Some(mv) => self.play(&mv).map(Some),
            None => Ok(None),
        }
    }

    fn game_over(&mut self, outcome: Outcome) -> Result<(), EngineError> {
        let seq = SearchEngine::new(1)?.best_sequence(&self.board)?;
        let final_score = seq.score * self.board.side_to_move().sign();
        tracing::info!(%outcome, final_score, "game over");
        self.emit(SessionEvent::GameOver {
            outcome,
            final_score,
        });
        Ok(())
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.cancel_search();
    }
}
