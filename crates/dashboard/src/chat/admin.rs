use std::cell::RefCell;
use std::rc::Rc;

use api::{AdminConversation, ChatMessage, ChatbotRequest, HttpClient, UserLocation, UserWeatherData};
use foundation::SessionId;
use runtime::SubscriptionTable;
use tracing::{debug, error, info, warn};
use weather::user_weather_data;

use super::{cap_context, chat_subscriptions, ChatAction, ChatPhase, ChatShell, WEATHER_BOT};
use crate::context::Context;
use crate::user_markers::UserMarkers;

pub const ADMIN_WELCOME: &str = "Hello! I'm ClimaChat, your AI weather assistant powered by Llama 3.3. I'm here to help you with weather information, forecasts, and weather-related questions. How can I assist you today?";
const NEW_CHAT_WELCOME: &str = "Hello! I'm ClimaChat, your AI weather assistant. I can help you check weather for any user location. How can I assist you today?";
const APOLOGY: &str = "I'm experiencing some technical difficulties right now. Please try again in a moment, or ask me about weather information!";

const WEATHER_WORDS: [&str; 10] = [
    "weather",
    "temperature",
    "temp",
    "rain",
    "sunny",
    "cloud",
    "condition",
    "hot",
    "cold",
    "humid",
];
const AFFIRMATIONS: [&str; 7] = ["yes", "yeah", "yep", "sure", "ok", "okay", "yup"];

/// Which user, if any, a message is asking about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    /// Index into the user list whose weather should be attached.
    pub target: Option<usize>,
    pub last_mentioned: Option<String>,
}

/// Resolves the user a message refers to.
///
/// A bare affirmation follows up on the last mentioned user. Otherwise a
/// weather word or "where" makes the first username found in the text the
/// target; a plain mention only updates the follow-up memory.
pub fn resolve_mention(message: &str, users: &[UserLocation], last: Option<&str>) -> Mention {
    let lower = message.to_lowercase();
    let affirmation = AFFIRMATIONS.contains(&lower.trim());
    let mentioned = || {
        users
            .iter()
            .position(|u| lower.contains(&u.username.to_lowercase()))
    };

    if let (true, Some(last)) = (affirmation, last) {
        return Mention {
            target: users.iter().position(|u| u.username == last),
            last_mentioned: Some(last.to_string()),
        };
    }
    let asks_weather = WEATHER_WORDS.iter().any(|w| lower.contains(w)) || lower.contains("where");
    match mentioned() {
        Some(i) => Mention {
            target: asks_weather.then_some(i),
            last_mentioned: Some(users[i].username.clone()),
        },
        None => Mention {
            target: None,
            last_mentioned: last.map(str::to_string),
        },
    }
}

#[derive(Debug, Default)]
struct AdminChatState {
    history: Vec<ChatMessage>,
    last_mentioned: Option<String>,
    session: Option<SessionId>,
}

/// The dashboard assistant that knows where every user is.
pub struct AdminChat<H> {
    ctx: Rc<Context<H>>,
    shell: ChatShell,
    markers: Option<Rc<UserMarkers<H>>>,
    state: RefCell<AdminChatState>,
}

impl<H: HttpClient> AdminChat<H> {
    pub fn new(ctx: Rc<Context<H>>) -> Self {
        Self {
            ctx,
            shell: ChatShell::new(WEATHER_BOT),
            markers: None,
            state: RefCell::new(AdminChatState::default()),
        }
    }

    /// Lets a targeted question pan the user map to that user.
    pub fn with_markers(mut self, markers: Rc<UserMarkers<H>>) -> Self {
        self.markers = Some(markers);
        self
    }

    pub fn subscriptions() -> SubscriptionTable<ChatAction> {
        chat_subscriptions()
    }

    pub async fn handle(&self, action: ChatAction) {
        match action {
            ChatAction::Send => self.send_message().await,
        }
    }

    pub fn init(&self) {
        self.shell.clear(self.ctx.ui());
        self.shell
            .append(self.ctx.ui(), self.ctx.clock.as_ref(), ADMIN_WELCOME, false);
    }

    pub fn phase(&self) -> ChatPhase {
        self.shell.phase()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.state.borrow().session.clone()
    }

    pub fn last_mentioned(&self) -> Option<String> {
        self.state.borrow().last_mentioned.clone()
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        self.state.borrow().history.clone()
    }

    pub async fn send_message(&self) {
        let (ui, clock) = (self.ctx.ui(), self.ctx.clock.as_ref());
        let Some(pending) = self.shell.begin(ui, clock) else {
            return;
        };
        let reply = self.ask(&pending.message).await;
        self.shell.finish(ui, clock, pending, &reply);
    }

    async fn ask(&self, message: &str) -> String {
        let users = match self.ctx.server().user_locations().await {
            Ok(users) => users,
            Err(e) => {
                warn!("could not fetch user locations: {e}");
                Vec::new()
            }
        };

        let mention = {
            let state = self.state.borrow();
            resolve_mention(message, &users, state.last_mentioned.as_deref())
        };
        self.state.borrow_mut().last_mentioned = mention.last_mentioned;
        let user_weather = match mention.target.map(|i| &users[i]) {
            Some(target) => self.target_weather(target).await,
            None => None,
        };

        let request = {
            let mut state = self.state.borrow_mut();
            let clock = self.ctx.clock.as_ref();
            let session = state
                .session
                .get_or_insert_with(|| {
                    SessionId::generate(clock.now_ms().max(0) as u64, clock.random())
                })
                .to_string();
            ChatbotRequest {
                message: message.to_string(),
                conversation_history: state.history.clone(),
                user_locations: Some(users),
                user_weather_data: user_weather,
                is_admin: Some(true),
                save_to_history: Some(true),
                session_id: Some(session),
                ..ChatbotRequest::default()
            }
        };

        match self.ctx.server().chatbot(&request).await {
            Ok(reply) => {
                let text = reply.response.unwrap_or_default();
                if reply.fallback {
                    debug!("chatbot answered with a fallback reply");
                }
                let mut state = self.state.borrow_mut();
                state.history.push(ChatMessage::user(message));
                state.history.push(ChatMessage::assistant(text.clone()));
                cap_context(&mut state.history, self.ctx.config.chat_context_limit);
                self.ctx.trace("chat", format!("admin reply {} chars", text.len()));
                text
            }
            Err(e) => {
                error!("chatbot api error: {e}");
                APOLOGY.to_string()
            }
        }
    }

    async fn target_weather(&self, target: &UserLocation) -> Option<UserWeatherData> {
        if let Some(markers) = &self.markers {
            markers.zoom_to_user(&target.username);
        }
        match self
            .ctx
            .openweather()
            .current(target.latitude, target.longitude)
            .await
        {
            Ok(current) => user_weather_data(
                &target.username,
                target.location_name.as_deref(),
                &current,
            ),
            Err(e) => {
                error!(user = %target.username, "error fetching weather: {e}");
                None
            }
        }
    }

    /// Clears everything; the next send starts a fresh session.
    pub fn new_chat(&self) {
        let ui = self.ctx.ui();
        if self.shell.phase() == ChatPhase::Sending {
            return;
        }
        self.shell.clear(ui);
        self.shell
            .append(ui, self.ctx.clock.as_ref(), NEW_CHAT_WELCOME, false);
        *self.state.borrow_mut() = AdminChatState::default();
        info!("started new admin chat");
    }

    /// Replays a saved conversation and continues it under its session id.
    pub fn load_conversation(&self, conversation: &AdminConversation) {
        let (ui, clock) = (self.ctx.ui(), self.ctx.clock.as_ref());
        self.shell.clear(ui);
        let mut state = AdminChatState {
            session: Some(SessionId::from_string(conversation.session_id.clone())),
            ..AdminChatState::default()
        };
        for turn in &conversation.messages {
            self.shell.append(ui, clock, &turn.message, true);
            self.shell.append(ui, clock, &turn.response, false);
            state.history.push(ChatMessage::user(turn.message.clone()));
            state.history.push(ChatMessage::assistant(turn.response.clone()));
            if let Some(user) = &turn.user_mentioned {
                state.last_mentioned = Some(user.clone());
            }
        }
        cap_context(&mut state.history, self.ctx.config.chat_context_limit);
        if let Some(user) = &state.last_mentioned {
            debug!(user = %user, "restored last mentioned user");
        }
        *self.state.borrow_mut() = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{CHAT_INPUT, CHAT_MESSAGES};
    use crate::testing::*;
    use crate::user_markers::MarkerStyle;
    use api::{AdminChatTurn, ChatRole};
    use foundation::LatLng;
    use layers::{MapSurface, MemoryMapSurface};
    use pretty_assertions::assert_eq;
    use std::pin::pin;

    const REPLY: &str = r#"{"success": true, "response": "Maria's area is 31°C and cloudy."}"#;

    fn users() -> Vec<UserLocation> {
        serde_json::from_str::<api::UserLocationsResponse>(TWO_USERS)
            .unwrap()
            .locations
    }

    fn chat_http() -> FakeHttp {
        FakeHttp::new()
            .route("/api/admin/user-locations/", 200, TWO_USERS)
            .route("/weather?", 200, MANILA_WEATHER)
            .route_post("/api/chatbot/", 200, REPLY)
    }

    #[test]
    fn weather_question_targets_named_user() {
        let m = resolve_mention("What's the weather for MARIA?", &users(), None);
        assert_eq!(m.target, Some(0));
        assert_eq!(m.last_mentioned.as_deref(), Some("maria"));
    }

    #[test]
    fn plain_mention_is_remembered_for_follow_up() {
        let m = resolve_mention("tell me about jose", &users(), None);
        assert_eq!(m, Mention { target: None, last_mentioned: Some("jose".into()) });

        let follow = resolve_mention("  Okay ", &users(), Some("jose"));
        assert_eq!(follow.target, Some(1));
        assert_eq!(follow.last_mentioned.as_deref(), Some("jose"));
    }

    #[test]
    fn affirmation_without_memory_targets_nobody() {
        let m = resolve_mention("yes", &users(), None);
        assert_eq!(m, Mention { target: None, last_mentioned: None });
    }

    #[test]
    fn where_question_counts_as_weather() {
        let m = resolve_mention("where is jose now", &users(), Some("maria"));
        assert_eq!(m.target, Some(1));
    }

    #[test]
    fn send_attaches_target_weather_and_session() {
        let h = Harness::build(
            chat_http(),
            FakeUi::new(),
            FakeClock::at_ms(NOW_MS).with_randoms(&[0.25]),
            Ok(LatLng::new(0.0, 0.0)),
        );
        let chat = AdminChat::new(h.ctx.clone());
        h.ui.type_into(CHAT_INPUT, "How hot is it for maria?");
        pollster::block_on(chat.handle(ChatAction::Send));

        let body = h.http().last("/api/chatbot/").unwrap().json_body().unwrap().clone();
        assert_eq!(body["is_admin"], true);
        assert_eq!(body["save_to_history"], true);
        assert_eq!(body["user_locations"].as_array().unwrap().len(), 2);
        assert_eq!(body["user_weather_data"]["username"], "maria");
        assert_eq!(body["user_weather_data"]["location"], "Quezon City");
        assert_eq!(body["user_weather_data"]["temperature"], 31.4);
        let session = body["session_id"].as_str().unwrap();
        assert!(session.starts_with("session_1700000000000_"));

        let history = chat.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, ChatRole::Assistant);
        assert_eq!(chat.last_mentioned().as_deref(), Some("maria"));

        h.ui.type_into(CHAT_INPUT, "thanks");
        pollster::block_on(chat.send_message());
        let body = h.http().last("/api/chatbot/").unwrap().json_body().unwrap().clone();
        assert_eq!(body["session_id"], session);
        assert_eq!(body["conversation_history"].as_array().unwrap().len(), 2);
        assert_eq!(body.get("user_weather_data"), Some(&serde_json::Value::Null));
    }

    #[test]
    fn targeted_question_pans_the_user_map() {
        let h = Harness::new(chat_http());
        let map = Rc::new(MemoryMapSurface::new(LatLng::new(0.0, 0.0), 6));
        let markers = Rc::new(UserMarkers::new(h.ctx.clone(), map.clone(), MarkerStyle::ChatWidget));
        pollster::block_on(markers.load_user_locations());
        let chat = AdminChat::new(h.ctx.clone()).with_markers(markers);

        h.ui.type_into(CHAT_INPUT, "is it raining where jose is?");
        pollster::block_on(chat.send_message());
        assert_eq!(map.view(), (LatLng::new(10.3, 123.9), 14));
        assert!(map.open_popup_id().is_some());
    }

    #[test]
    fn second_send_while_sending_is_ignored() {
        let h = Harness::new(chat_http().hold("/api/chatbot/"));
        let chat = AdminChat::new(h.ctx.clone());
        h.ui.type_into(CHAT_INPUT, "first");

        let mut first = pin!(chat.send_message());
        assert!(poll_once(first.as_mut()).is_pending());
        assert_eq!(chat.phase(), ChatPhase::Sending);

        h.ui.type_into(CHAT_INPUT, "second");
        pollster::block_on(chat.send_message());
        assert_eq!(h.http().count("/api/chatbot/"), 1);
        let thinking = h
            .ui
            .nodes(CHAT_MESSAGES)
            .iter()
            .filter(|n| n.contains("Thinking..."))
            .count();
        assert_eq!(thinking, 1);
        assert_eq!(h.ui.element(CHAT_INPUT).value, "second");

        assert!(poll_once(first.as_mut()).is_ready());
        assert_eq!(chat.phase(), ChatPhase::Idle);
    }

    #[test]
    fn failed_send_appends_one_apology() {
        let http = FakeHttp::new()
            .route("/api/admin/user-locations/", 200, TWO_USERS)
            .route_post("/api/chatbot/", 500, "boom");
        let h = Harness::new(http);
        let chat = AdminChat::new(h.ctx.clone());
        h.ui.type_into(CHAT_INPUT, "hello");
        pollster::block_on(chat.send_message());

        let nodes = h.ui.nodes(CHAT_MESSAGES);
        assert_eq!(nodes.len(), 2);
        assert!(nodes[1].contains("technical difficulties"));
        assert!(nodes.iter().all(|n| !n.contains("Thinking...")));
        assert!(chat.history().is_empty());
        assert_eq!(chat.phase(), ChatPhase::Idle);
    }

    #[test]
    fn unreachable_user_list_still_asks_the_bot() {
        let http = FakeHttp::new()
            .fail("/api/admin/user-locations/")
            .route_post("/api/chatbot/", 200, REPLY);
        let h = Harness::new(http);
        let chat = AdminChat::new(h.ctx.clone());
        h.ui.type_into(CHAT_INPUT, "weather for maria");
        pollster::block_on(chat.send_message());
        let body = h.http().last("/api/chatbot/").unwrap().json_body().unwrap().clone();
        assert_eq!(body["user_locations"], serde_json::json!([]));
        assert_eq!(h.http().count("/weather?"), 0);
    }

    #[test]
    fn loading_restores_session_and_mention() {
        let h = Harness::new(chat_http());
        let chat = AdminChat::new(h.ctx.clone());
        let convo = AdminConversation {
            session_id: "session_1_abc".into(),
            messages: vec![
                AdminChatTurn {
                    message: "weather for maria".into(),
                    response: "Sunny.".into(),
                    user_mentioned: Some("maria".into()),
                },
                AdminChatTurn {
                    message: "and tomorrow?".into(),
                    response: "Rain.".into(),
                    user_mentioned: None,
                },
            ],
            ..AdminConversation::default()
        };
        chat.load_conversation(&convo);
        assert_eq!(h.ui.nodes(CHAT_MESSAGES).len(), 4);
        assert_eq!(chat.history().len(), 4);
        assert_eq!(chat.last_mentioned().as_deref(), Some("maria"));
        assert_eq!(chat.session_id().unwrap().as_str(), "session_1_abc");

        chat.new_chat();
        assert!(chat.session_id().is_none());
        assert!(chat.last_mentioned().is_none());
        assert!(chat.history().is_empty());
        let nodes = h.ui.nodes(CHAT_MESSAGES);
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].contains("check weather for any user location"));
    }
}
