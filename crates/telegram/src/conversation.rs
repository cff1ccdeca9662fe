//! Registration conversation engine
//!
//! Both transports (webhook and long polling) hand every inbound update to
//! [`Conversation::handle`]. Failures are reported to the sender in the chat;
//! nothing here surfaces as a transport-level error.

use directory::Directory;
use std::sync::Arc;
use std::time::Duration;
use teloxide::types::ChatId;
use teloxide::utils::command::BotCommands;
use tokio::task::JoinHandle;

use crate::constants::{emoji, messages};
use crate::dedup::RecentCallbacks;
use crate::error::{ConversationError, ConversationResult, UserMessage};
use crate::gate::{transition, GateAction, GateInput, GateState};
use crate::keyboards;
use crate::messenger::{Messenger, OutgoingMessage};
use crate::options::{bounded, OptionFetcher};
use crate::registration;
use crate::selection::{Selection, SelectionKind};
use crate::store::SelectionStore;
use crate::types::{CallbackEvent, Command, InboundUpdate, Sender, TextMessage};

/// Walks chats from the secret prompt to a persisted registration
pub struct Conversation {
    directory: Arc<dyn Directory>,
    messenger: Arc<dyn Messenger>,
    store: SelectionStore,
    options: OptionFetcher,
    secret: String,
    recent_callbacks: RecentCallbacks,
}

impl Conversation {
    /// Create a conversation with default TTL and lookup timeout
    ///
    /// # Arguments
    /// * `directory` - Source of programs, enterprises and mentors
    /// * `messenger` - Outbound channel to the chats
    /// * `secret` - Shared registration password
    pub fn new(
        directory: Arc<dyn Directory>,
        messenger: Arc<dyn Messenger>,
        secret: impl Into<String>,
    ) -> Self {
        let options = OptionFetcher::new(
            directory.clone(),
            Duration::from_secs(crate::constants::DEFAULT_LOOKUP_TIMEOUT_SECS),
        );
        Self {
            directory,
            messenger,
            store: SelectionStore::default(),
            options,
            secret: secret.into(),
            recent_callbacks: RecentCallbacks::default(),
        }
    }

    /// Idle time after which a pending registration is dropped
    pub fn with_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.store = SelectionStore::new(ttl);
        self
    }

    /// Budget for each directory call
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.options = OptionFetcher::new(self.directory.clone(), timeout);
        self
    }

    pub fn store(&self) -> &SelectionStore {
        &self.store
    }

    /// Process one inbound update
    pub async fn handle(&self, update: InboundUpdate) {
        match update {
            InboundUpdate::Text(message) => self.handle_text(message).await,
            InboundUpdate::Callback(event) => self.handle_callback(event).await,
        }
    }

    async fn handle_text(&self, message: TextMessage) {
        let chat_id = message.chat_id;
        let input = GateInput::from_text(&message.text);
        self.apply(chat_id, &message.sender, input).await;
    }

    async fn handle_callback(&self, event: CallbackEvent) {
        let chat_id = event.chat_id;

        if !self.recent_callbacks.first_delivery(&event.callback_id) {
            tracing::debug!("Skipping redelivered callback {}", event.callback_id);
            return;
        }

        if let Err(e) = self
            .messenger
            .answer_callback(&event.callback_id, Some(messages::CHOICE_RECEIVED))
            .await
        {
            tracing::warn!("Failed to answer callback {}: {}", event.callback_id, e);
        }

        let selection = match event.data.parse::<Selection>() {
            Ok(selection) => selection,
            Err(e) => {
                tracing::warn!("Rejected callback data from chat {}: {}", chat_id.0, e);
                self.report(chat_id, e).await;
                return;
            }
        };

        self.apply(chat_id, &event.sender, GateInput::Select(selection)).await;
    }

    async fn apply(&self, chat_id: ChatId, sender: &Sender, input: GateInput) {
        let result = match self.gate_state(chat_id).await {
            Ok(state) => {
                let action = transition(state, &input, &self.secret);
                tracing::debug!("Chat {} in {:?} -> {:?}", chat_id.0, state, action);
                self.perform(chat_id, sender, action).await
            }
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            self.report(chat_id, e).await;
        }
    }

    /// Where the chat stands; a persisted chat drops any leftover pending entry
    async fn gate_state(&self, chat_id: ChatId) -> ConversationResult<GateState> {
        let user = bounded(
            self.options.timeout(),
            "registration",
            self.directory.find_user(chat_id.0),
        )
        .await?;

        if user.is_some() {
            self.store.discard(chat_id);
            return Ok(GateState::Registered);
        }

        Ok(match self.store.step(chat_id) {
            Some(step) => GateState::Selecting(step),
            None => GateState::Unregistered,
        })
    }

    async fn perform(
        &self,
        chat_id: ChatId,
        sender: &Sender,
        action: GateAction,
    ) -> ConversationResult<()> {
        match action {
            GateAction::PromptSecret => self.say(chat_id, messages::PROMPT_SECRET).await,
            GateAction::RejectSecret => self.say(chat_id, messages::INCORRECT_SECRET).await,
            GateAction::OfferPrograms => self.offer_programs(chat_id).await,
            GateAction::AlreadyRegistered => self.say(chat_id, messages::ALREADY_REGISTERED).await,
            GateAction::ShowHelp => {
                self.say(chat_id, Command::descriptions().to_string()).await
            }
            GateAction::CancelSelection => {
                self.store.discard(chat_id);
                tracing::info!("Chat {} cancelled registration", chat_id.0);
                self.say(chat_id, messages::CANCELLED).await
            }
            GateAction::NothingToCancel => self.say(chat_id, messages::NOTHING_TO_CANCEL).await,
            GateAction::RemindSelection => self.say(chat_id, messages::REMIND_SELECTION).await,
            GateAction::RequireSecret => self.say(chat_id, messages::SECRET_REQUIRED).await,
            GateAction::Proceed(selection) => match selection.kind {
                SelectionKind::Program => self.select_program(chat_id, &selection.id).await,
                SelectionKind::Enterprise => self.select_enterprise(chat_id, &selection.id).await,
                SelectionKind::Mentor => self.select_mentor(chat_id, sender, &selection.id).await,
            },
            GateAction::Ignore => {
                tracing::debug!("Ignoring input from registered chat {}", chat_id.0);
                Ok(())
            }
        }
    }

    async fn offer_programs(&self, chat_id: ChatId) -> ConversationResult<()> {
        let listed = self
            .options
            .programs()
            .await
            .and_then(|programs| keyboards::programs_keyboard(&programs));
        let keyboard = match listed {
            Ok(keyboard) => keyboard,
            Err(ConversationError::NoOptionsAvailable(_)) => {
                return self.say(chat_id, messages::NO_PROGRAMS).await;
            }
            Err(e) => return Err(e),
        };

        self.store.authorize(chat_id);
        self.send(OutgoingMessage::with_keyboard(
            chat_id,
            messages::CHOOSE_PROGRAM,
            keyboard,
        ))
        .await
    }

    async fn select_program(&self, chat_id: ChatId, program_id: &str) -> ConversationResult<()> {
        let program = self.options.program(program_id).await?;
        self.store.begin_or_update(chat_id, &program.id)?;

        let listed = self
            .options
            .enterprises(&program.id)
            .await
            .and_then(|enterprises| keyboards::enterprises_keyboard(&enterprises));
        match listed {
            Ok(keyboard) => {
                self.send(OutgoingMessage::with_keyboard(
                    chat_id,
                    format!(
                        "{} You selected {}!\n\nPlease choose a social enterprise:",
                        emoji::SUCCESS,
                        program.name
                    ),
                    keyboard,
                ))
                .await
            }
            Err(ConversationError::NoOptionsAvailable(_)) => {
                self.say(
                    chat_id,
                    format!(
                        "{} No social enterprises available under {}.",
                        emoji::WARNING,
                        program.name
                    ),
                )
                .await
            }
            Err(e) => Err(e),
        }
    }

    async fn select_enterprise(&self, chat_id: ChatId, enterprise_id: &str) -> ConversationResult<()> {
        let program_id = self
            .store
            .get(chat_id)
            .and_then(|entry| entry.program_id)
            .ok_or(ConversationError::NoPendingSelection)?;
        let enterprise = self.options.enterprise(&program_id, enterprise_id).await?;
        self.store
            .set_enterprise(chat_id, &enterprise.id, &enterprise.name)?;

        let listed = self
            .options
            .mentors(&enterprise.id)
            .await
            .and_then(|mentors| keyboards::mentors_keyboard(&mentors));
        match listed {
            Ok(keyboard) => {
                self.send(OutgoingMessage::with_keyboard(
                    chat_id,
                    format!(
                        "{} You selected {}!\n\nPlease choose your Mentor:",
                        emoji::SUCCESS,
                        enterprise.label()
                    ),
                    keyboard,
                ))
                .await
            }
            Err(ConversationError::NoOptionsAvailable(_)) => {
                self.say(
                    chat_id,
                    format!(
                        "{} No mentors available under {}.",
                        emoji::WARNING,
                        enterprise.label()
                    ),
                )
                .await
            }
            Err(e) => Err(e),
        }
    }

    async fn select_mentor(
        &self,
        chat_id: ChatId,
        sender: &Sender,
        mentor_id: &str,
    ) -> ConversationResult<()> {
        let enterprise_id = self
            .store
            .get(chat_id)
            .and_then(|entry| entry.enterprise_id)
            .ok_or(ConversationError::NoPendingSelection)?;
        let mentor = self.options.mentor(&enterprise_id, mentor_id).await?;
        self.store.set_mentor(chat_id, &mentor.id, &mentor.full_name())?;

        let user = registration::finalize(
            &self.store,
            self.directory.as_ref(),
            chat_id,
            sender,
            self.options.timeout(),
        )
        .await?;

        self.say(
            chat_id,
            format!(
                "{} You are now registered under {} with Mentor {}.\n\nWelcome to LSEED Insight!",
                emoji::SUCCESS,
                user.enterprise_name,
                user.mentor_name
            ),
        )
        .await
    }

    async fn say(&self, chat_id: ChatId, text: impl Into<String>) -> ConversationResult<()> {
        self.send(OutgoingMessage::text(chat_id, text)).await
    }

    async fn send(&self, message: OutgoingMessage) -> ConversationResult<()> {
        self.messenger.send(message).await?;
        Ok(())
    }

    /// Tell the sender what went wrong; transport failures are only logged
    async fn report(&self, chat_id: ChatId, err: ConversationError) {
        if let ConversationError::Transport(e) = &err {
            tracing::error!("Failed to reach chat {}: {}", chat_id.0, e);
            return;
        }

        tracing::warn!("Registration step failed for chat {}: {}", chat_id.0, err);
        if let Err(e) = self
            .messenger
            .send(OutgoingMessage::text(chat_id, err.user_message()))
            .await
        {
            tracing::error!("Failed to report error to chat {}: {}", chat_id.0, e);
        }
    }

    /// Drop expired pending registrations and forgotten callback ids
    pub fn sweep(&self) -> usize {
        let expired = self.store.purge_expired();
        let callbacks = self.recent_callbacks.cleanup();
        if expired > 0 {
            tracing::info!("Dropped {} expired pending registrations", expired);
        }
        if callbacks > 0 {
            tracing::debug!("Forgot {} callback ids", callbacks);
        }
        expired
    }

    /// Run [`sweep`](Self::sweep) in the background every `interval`
    pub fn spawn_sweeper(conversation: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(interval);
            loop {
                interval.tick().await;
                conversation.sweep();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messenger::RecordingMessenger;
    use crate::store::Step;
    use crate::testing::SlowInserts;
    use directory::{MemoryDirectory, TelegramUser};
    use teloxide::types::InlineKeyboardButtonKind;

    const SECRET: &str = "lseed2025";
    const CHAT: ChatId = ChatId(111);

    fn seeded() -> MemoryDirectory {
        MemoryDirectory::new()
            .with_program("p1", "Program A")
            .with_enterprise("e1", "Green Roots", Some("GR"), "p1")
            .with_mentor("m1", "Ana", "Reyes", &["e1"])
            .with_mentorship("e1", "m1")
    }

    fn setup(directory: MemoryDirectory) -> (Conversation, Arc<RecordingMessenger>, Arc<MemoryDirectory>) {
        let directory = Arc::new(directory);
        let messenger = Arc::new(RecordingMessenger::new());
        let conversation = Conversation::new(directory.clone(), messenger.clone(), SECRET);
        (conversation, messenger, directory)
    }

    fn sender() -> Sender {
        Sender {
            username: Some("ana_student".to_string()),
            first_name: Some("Bea".to_string()),
        }
    }

    fn text(chat_id: ChatId, text: &str) -> InboundUpdate {
        InboundUpdate::Text(TextMessage {
            chat_id,
            sender: sender(),
            text: text.to_string(),
        })
    }

    fn callback(chat_id: ChatId, id: &str, data: &str) -> InboundUpdate {
        InboundUpdate::Callback(CallbackEvent {
            callback_id: id.to_string(),
            chat_id,
            sender: sender(),
            data: data.to_string(),
        })
    }

    fn last_text(messenger: &RecordingMessenger, chat_id: ChatId) -> String {
        messenger.last_to(chat_id).map(|m| m.text).unwrap_or_default()
    }

    fn callback_data(message: &OutgoingMessage) -> Vec<String> {
        message
            .keyboard
            .as_ref()
            .map(|k| {
                k.inline_keyboard
                    .iter()
                    .flatten()
                    .filter_map(|b| match &b.kind {
                        InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_full_registration() {
        let (conversation, messenger, directory) = setup(seeded());

        conversation.handle(text(CHAT, "/start")).await;
        assert_eq!(last_text(&messenger, CHAT), messages::PROMPT_SECRET);

        conversation.handle(text(CHAT, SECRET)).await;
        let offer = messenger.last_to(CHAT).unwrap();
        assert_eq!(offer.text, messages::CHOOSE_PROGRAM);
        assert_eq!(callback_data(&offer), vec!["program_p1"]);
        assert_eq!(conversation.store().step(CHAT), Some(Step::AwaitingProgram));

        conversation.handle(callback(CHAT, "q1", "program_p1")).await;
        let enterprises = messenger.last_to(CHAT).unwrap();
        assert!(enterprises.text.contains("You selected Program A!"));
        assert_eq!(callback_data(&enterprises), vec!["enterprise_e1"]);

        conversation.handle(callback(CHAT, "q2", "enterprise_e1")).await;
        let mentors = messenger.last_to(CHAT).unwrap();
        assert!(mentors.text.contains("Please choose your Mentor"));
        assert_eq!(callback_data(&mentors), vec!["mentor_m1"]);

        conversation.handle(callback(CHAT, "q3", "mentor_m1")).await;
        assert_eq!(
            last_text(&messenger, CHAT),
            "✅ You are now registered under Green Roots with Mentor Ana Reyes.\n\nWelcome to LSEED Insight!"
        );

        let user = directory.find_user(CHAT.0).await.unwrap().unwrap();
        assert_eq!(user.enterprise_id, "e1");
        assert_eq!(user.enterprise_name, "Green Roots");
        assert_eq!(user.mentor_id, "m1");
        assert_eq!(user.mentor_name, "Ana Reyes");
        assert_eq!(user.username.as_deref(), Some("ana_student"));
        assert!(conversation.store().get(CHAT).is_none());
        assert_eq!(messenger.answered(), vec!["q1", "q2", "q3"]);

        // Registered now
        conversation.handle(text(CHAT, "/start")).await;
        assert_eq!(last_text(&messenger, CHAT), messages::ALREADY_REGISTERED);
        let before = messenger.sent().len();
        conversation.handle(text(CHAT, "hello")).await;
        assert_eq!(messenger.sent().len(), before);
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let (conversation, messenger, _) = setup(seeded());

        conversation.handle(text(CHAT, "/start")).await;
        conversation.handle(text(CHAT, "/start")).await;

        let sent = messenger.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|m| m.text == messages::PROMPT_SECRET));
        assert!(conversation.store().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_secret() {
        let (conversation, messenger, _) = setup(seeded());

        conversation.handle(text(CHAT, "guess")).await;
        assert_eq!(last_text(&messenger, CHAT), messages::INCORRECT_SECRET);
        assert!(conversation.store().get(CHAT).is_none());
    }

    #[tokio::test]
    async fn test_no_programs_keeps_chat_unregistered() {
        let (conversation, messenger, _) = setup(MemoryDirectory::new());

        conversation.handle(text(CHAT, SECRET)).await;
        assert_eq!(last_text(&messenger, CHAT), messages::NO_PROGRAMS);
        assert!(conversation.store().get(CHAT).is_none());
    }

    #[tokio::test]
    async fn test_no_enterprises_reported_as_no_options() {
        let (conversation, messenger, _) =
            setup(MemoryDirectory::new().with_program("p1", "Program A"));

        conversation.handle(text(CHAT, SECRET)).await;
        conversation.handle(callback(CHAT, "q1", "program_p1")).await;

        let reply = messenger.last_to(CHAT).unwrap();
        assert_eq!(reply.text, "⚠️ No social enterprises available under Program A.");
        assert!(reply.keyboard.is_none());
    }

    #[tokio::test]
    async fn test_no_mentors_reported_as_no_options() {
        let directory = MemoryDirectory::new()
            .with_program("p1", "Program A")
            .with_enterprise("e1", "Green Roots", None, "p1")
            .with_mentor("m1", "Ana", "Reyes", &[])
            .with_mentorship("e1", "m1");
        let (conversation, messenger, _) = setup(directory);

        conversation.handle(text(CHAT, SECRET)).await;
        conversation.handle(callback(CHAT, "q1", "program_p1")).await;
        conversation.handle(callback(CHAT, "q2", "enterprise_e1")).await;

        assert_eq!(
            last_text(&messenger, CHAT),
            "⚠️ No mentors available under Green Roots."
        );
    }

    #[tokio::test]
    async fn test_callback_before_secret_is_refused() {
        let (conversation, messenger, directory) = setup(seeded());

        conversation.handle(callback(CHAT, "q1", "mentor_m1")).await;

        assert_eq!(last_text(&messenger, CHAT), messages::SECRET_REQUIRED);
        assert_eq!(messenger.answered(), vec!["q1"]);
        assert_eq!(directory.user_count(), 0);
    }

    #[tokio::test]
    async fn test_mentor_before_enterprise() {
        let (conversation, messenger, directory) = setup(seeded());

        conversation.handle(text(CHAT, SECRET)).await;
        conversation.handle(callback(CHAT, "q1", "mentor_m1")).await;

        assert_eq!(
            last_text(&messenger, CHAT),
            ConversationError::NoPendingSelection.user_message()
        );
        assert_eq!(directory.user_count(), 0);
    }

    #[tokio::test]
    async fn test_selection_outside_previous_choice_is_rejected() {
        let directory = seeded()
            .with_program("p2", "Program B")
            .with_enterprise("e2", "Blue Waters", None, "p2")
            .with_mentor("m2", "Ben", "Cruz", &["e2"])
            .with_mentorship("e2", "m2");
        let (conversation, messenger, directory) = setup(directory);
        let invalid = ConversationError::InvalidSelection(String::new()).user_message();

        conversation.handle(text(CHAT, SECRET)).await;
        conversation.handle(callback(CHAT, "q1", "program_p1")).await;
        conversation.handle(callback(CHAT, "q2", "enterprise_e2")).await;
        assert_eq!(last_text(&messenger, CHAT), invalid);
        assert_eq!(conversation.store().get(CHAT).unwrap().enterprise_id, None);

        conversation.handle(callback(CHAT, "q3", "enterprise_e1")).await;
        conversation.handle(callback(CHAT, "q4", "mentor_m2")).await;
        assert_eq!(last_text(&messenger, CHAT), invalid);
        assert_eq!(directory.user_count(), 0);

        conversation.handle(callback(CHAT, "q5", "mentor_m1")).await;
        assert_eq!(directory.user_count(), 1);
    }

    #[tokio::test]
    async fn test_enterprise_before_program() {
        let (conversation, messenger, _) = setup(seeded());

        conversation.handle(text(CHAT, SECRET)).await;
        conversation.handle(callback(CHAT, "q1", "enterprise_e1")).await;

        assert_eq!(
            last_text(&messenger, CHAT),
            ConversationError::NoPendingSelection.user_message()
        );
        assert_eq!(conversation.store().step(CHAT), Some(Step::AwaitingProgram));
    }

    #[tokio::test]
    async fn test_malformed_callback_data() {
        let (conversation, messenger, _) = setup(seeded());

        conversation.handle(text(CHAT, SECRET)).await;
        conversation.handle(callback(CHAT, "q1", "coach_9")).await;

        assert_eq!(
            last_text(&messenger, CHAT),
            ConversationError::InvalidSelection(String::new()).user_message()
        );
        assert_eq!(messenger.answered(), vec!["q1"]);
    }

    #[tokio::test]
    async fn test_redelivered_callback_is_skipped() {
        let (conversation, messenger, _) = setup(seeded());

        conversation.handle(text(CHAT, SECRET)).await;
        conversation.handle(callback(CHAT, "q1", "program_p1")).await;
        let before = messenger.sent().len();

        conversation.handle(callback(CHAT, "q1", "program_p1")).await;
        assert_eq!(messenger.sent().len(), before);
        assert_eq!(messenger.answered(), vec!["q1"]);
    }

    #[tokio::test]
    async fn test_double_mentor_selection_persists_once() {
        let memory = Arc::new(seeded());
        let messenger = Arc::new(RecordingMessenger::new());
        let conversation = Conversation::new(
            Arc::new(SlowInserts::new(memory.clone(), Duration::from_millis(50))),
            messenger.clone(),
            SECRET,
        );

        conversation.handle(text(CHAT, SECRET)).await;
        conversation.handle(callback(CHAT, "q1", "program_p1")).await;
        conversation.handle(callback(CHAT, "q2", "enterprise_e1")).await;

        tokio::join!(
            conversation.handle(callback(CHAT, "q3", "mentor_m1")),
            conversation.handle(callback(CHAT, "q4", "mentor_m1")),
        );

        assert_eq!(memory.user_count(), 1);
        let sent = messenger.sent();
        let confirmations = sent
            .iter()
            .filter(|m| m.text.starts_with("✅ You are now registered"))
            .count();
        assert_eq!(confirmations, 1);
        // The second tap found the registration in flight
        assert_eq!(
            sent.iter().filter(|m| m.text == messages::ALREADY_REGISTERED).count(),
            1
        );
        assert!(conversation.store().get(CHAT).is_none());
    }

    #[tokio::test]
    async fn test_cancel() {
        let (conversation, messenger, _) = setup(seeded());

        conversation.handle(text(CHAT, "/cancel")).await;
        assert_eq!(last_text(&messenger, CHAT), messages::NOTHING_TO_CANCEL);

        conversation.handle(text(CHAT, SECRET)).await;
        conversation.handle(callback(CHAT, "q1", "program_p1")).await;
        conversation.handle(text(CHAT, "/cancel")).await;
        assert_eq!(last_text(&messenger, CHAT), messages::CANCELLED);
        assert!(conversation.store().get(CHAT).is_none());

        conversation.handle(callback(CHAT, "q2", "enterprise_e1")).await;
        assert_eq!(last_text(&messenger, CHAT), messages::SECRET_REQUIRED);
    }

    #[tokio::test]
    async fn test_text_while_selecting() {
        let (conversation, messenger, _) = setup(seeded());

        conversation.handle(text(CHAT, SECRET)).await;
        conversation.handle(text(CHAT, "Green Roots")).await;
        assert_eq!(last_text(&messenger, CHAT), messages::REMIND_SELECTION);

        conversation.handle(text(CHAT, "/start")).await;
        assert_eq!(last_text(&messenger, CHAT), messages::CHOOSE_PROGRAM);
    }

    #[tokio::test]
    async fn test_help() {
        let (conversation, messenger, _) = setup(seeded());

        conversation.handle(text(CHAT, "/help")).await;
        let reply = last_text(&messenger, CHAT);
        assert!(reply.contains("/start"));
        assert!(reply.contains("/cancel"));
    }

    #[tokio::test]
    async fn test_registered_chat_drops_pending_entry() {
        let user = TelegramUser {
            chat_id: CHAT.0,
            username: None,
            first_name: None,
            enterprise_id: "e1".to_string(),
            enterprise_name: "Green Roots".to_string(),
            mentor_id: "m1".to_string(),
            mentor_name: "Ana Reyes".to_string(),
            registered_at: chrono::Utc::now(),
        };
        let (conversation, messenger, _) = setup(seeded().with_user(user));
        conversation.store().authorize(CHAT);

        conversation.handle(callback(CHAT, "q1", "program_p1")).await;
        assert!(messenger.sent().is_empty());
        assert!(conversation.store().get(CHAT).is_none());
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_reported() {
        let (conversation, messenger, _) = setup(seeded());
        messenger.set_failing(true);

        conversation.handle(text(CHAT, "/start")).await;
        messenger.set_failing(false);
        assert!(messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn test_sweep_drops_expired_entries() {
        let (conversation, _, _) = setup(seeded());
        let conversation = conversation.with_ttl(chrono::Duration::zero());

        conversation.handle(text(CHAT, SECRET)).await;
        assert!(conversation.store().get(CHAT).is_none());
        assert_eq!(conversation.sweep(), 1);
    }
}
