//! Commands and an invoker that runs registered command types with undo.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::error::{PatternError, PatternResult};

/// A reversible action producing an `O` each way
///
/// A command owns whatever it acts on (usually a shared handle to the
/// receiver) so the invoker can replay `unexecute` later.
pub trait Command<O>: Send + 'static {
    /// Name used in error messages and logs
    fn name(&self) -> &str {
        type_name::<Self>()
    }

    /// Performs the action
    fn execute(&mut self) -> PatternResult<O>;

    /// Reverts what `execute` did
    fn unexecute(&mut self) -> PatternResult<O>;
}

type History<O> = Vec<Box<dyn Command<O>>>;

/// Runs commands of the types it was told to accept and keeps them for undo
pub struct Invoker<O> {
    name: String,
    accepted: HashMap<TypeId, &'static str>,
    history: Mutex<History<O>>,
}

impl<O: 'static> Invoker<O> {
    /// Creates an invoker that accepts no command types yet
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        info!("Creating invoker {}", name);
        Self {
            name,
            accepted: HashMap::new(),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Accepts commands of type `C` (builder style)
    pub fn accept<C: Command<O>>(mut self) -> Self {
        self.accepted.insert(TypeId::of::<C>(), type_name::<C>());
        self
    }

    /// Checks if commands of type `C` are accepted
    pub fn accepts<C: Command<O>>(&self) -> bool {
        self.accepted.contains_key(&TypeId::of::<C>())
    }

    /// Type names of the accepted commands, sorted
    pub fn accepted(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.accepted.values().copied().collect();
        names.sort_unstable();
        names
    }

    /// Runs a command and records it for `undo`
    ///
    /// Commands of a type the invoker does not accept are refused with
    /// `UnregisteredCommand` before they run. A command whose `execute`
    /// fails is not recorded.
    pub fn execute<C: Command<O>>(&self, mut command: C) -> PatternResult<O> {
        if !self.accepts::<C>() {
            warn!("Invoker {} refused command {}", self.name, command.name());
            return Err(PatternError::UnregisteredCommand {
                invoker: self.name.clone(),
                command: command.name().to_string(),
            });
        }

        let output = command.execute()?;

        let mut history = self.lock();
        debug!("Invoker {} ran {} (history: {})", self.name, command.name(), history.len() + 1);
        history.push(Box::new(command));
        Ok(output)
    }

    /// Reverts the most recent command
    ///
    /// If `unexecute` fails the command stays at the top of the history.
    pub fn undo(&self) -> PatternResult<O> {
        let mut command = self.lock().pop().ok_or_else(|| PatternError::EmptyHistory {
            invoker: self.name.clone(),
        })?;

        match command.unexecute() {
            Ok(output) => {
                debug!("Invoker {} undid {}", self.name, command.name());
                Ok(output)
            }
            Err(e) => {
                warn!("Invoker {} failed to undo {}: {}", self.name, command.name(), e);
                self.lock().push(command);
                Err(e)
            }
        }
    }

    /// Names of the recorded commands, oldest first
    pub fn history(&self) -> Vec<String> {
        self.lock().iter().map(|c| c.name().to_string()).collect()
    }

    /// Number of recorded commands
    pub fn history_len(&self) -> usize {
        self.lock().len()
    }

    /// Forgets every recorded command without reverting it
    pub fn clear_history(&self) {
        self.lock().clear();
    }

    /// The invoker's name
    pub fn name(&self) -> &str {
        &self.name
    }

    // Commands run outside the lock; the history is only pushed or popped whole.
    fn lock(&self) -> MutexGuard<'_, History<O>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<O> std::fmt::Debug for Invoker<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invoker")
            .field("name", &self.name)
            .field("accepted", &self.accepted.len())
            .finish()
    }
}
