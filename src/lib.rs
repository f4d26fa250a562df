pub mod ai;
pub mod game;
pub mod utils;

use gloo_timers::future::TimeoutFuture;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{
    best_move, minimax_score, policy_for_roll, AiAgent, ConfigError, Difficulty, MovePolicy,
};
pub use game::{
    Board, Cell, ComputerMove, GameEvent, GameSession, Mark, MoveOutcome, MoveRejection, Opponent,
    PlayerIntent, RuleEngine, RuleError, SessionConfig, WINNING_LINES,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
    web_sys::console::log_1(&"tic-tac-toe core ready".into());
}

fn to_js_error(error: RuleError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn config_error_to_js(error: ConfigError) -> JsValue {
    to_js_error(RuleError::Config { error })
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

#[derive(Serialize)]
struct MoveResponse {
    outcome: MoveOutcome,
    state: GameSession,
}

#[derive(Serialize)]
struct ComputerMoveResponse {
    index: usize,
    policy: MovePolicy,
    outcome: MoveOutcome,
    state: GameSession,
}

#[derive(Serialize)]
struct ThinkResponse {
    index: usize,
    policy: MovePolicy,
}

#[wasm_bindgen]
pub struct GameEngine {
    session: GameSession,
    engine: RuleEngine,
}

#[wasm_bindgen]
impl GameEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<GameEngine, JsValue> {
        let config = match config_json {
            Some(json) => serde_json::from_str(&json).map_err(serde_to_js_error)?,
            None => SessionConfig::default(),
        };
        let session = GameSession::new(config).map_err(config_error_to_js)?;
        Ok(GameEngine {
            session,
            engine: RuleEngine::new(),
        })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session).map_err(serde_to_js_error)
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let session: GameSession = serde_json::from_str(json).map_err(serde_to_js_error)?;
        self.session = session;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    pub fn play_move(&mut self, index: usize) -> Result<String, JsValue> {
        let outcome = self
            .engine
            .play_move(&mut self.session, index)
            .map_err(to_js_error)?;
        let response = MoveResponse {
            outcome,
            state: self.session.clone(),
        };
        serde_json::to_string(&response).map_err(serde_to_js_error)
    }

    pub fn computer_turn(&mut self) -> Result<String, JsValue> {
        let reply = self
            .engine
            .computer_turn(&mut self.session)
            .map_err(to_js_error)?;
        let response = ComputerMoveResponse {
            index: reply.index,
            policy: reply.policy,
            outcome: reply.outcome,
            state: self.session.clone(),
        };
        serde_json::to_string(&response).map_err(serde_to_js_error)
    }

    pub fn dispatch_json(&mut self, intent_json: &str) -> Result<String, JsValue> {
        let intent: PlayerIntent = serde_json::from_str(intent_json).map_err(serde_to_js_error)?;
        let outcome = self
            .engine
            .dispatch(&mut self.session, intent)
            .map_err(to_js_error)?;
        let response = MoveResponse {
            outcome,
            state: self.session.clone(),
        };
        serde_json::to_string(&response).map_err(serde_to_js_error)
    }

    pub fn reset(&mut self) -> Result<String, JsValue> {
        self.session.reset();
        self.state_json()
    }

    /// 异步计算电脑的下一步但不落子，可选延迟让前端做"思考中"效果。
    pub fn think_move(&self, delay_ms: Option<u32>) -> Promise {
        let session = self.session.clone();
        let delay = delay_ms.unwrap_or(0);

        future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }

            if !session.is_active() {
                return Err(to_js_error(RuleError::InvalidMove {
                    reason: MoveRejection::SessionInactive,
                }));
            }

            let (mark, difficulty) = match session.opponent {
                Opponent::Computer { mark, difficulty } => (mark, difficulty),
                Opponent::Human => return Err(to_js_error(RuleError::NotComputerTurn)),
            };

            let mut agent = AiAgent::new();
            let (index, policy) = agent
                .select_move(&session.board, mark, mark.opponent(), difficulty)
                .map_err(to_js_error)?;
            let json = serde_json::to_string(&ThinkResponse { index, policy })
                .map_err(serde_to_js_error)?;
            Ok(JsValue::from_str(&json))
        })
    }
}

#[wasm_bindgen(js_name = "newSession")]
pub fn new_session(config: JsValue) -> Result<JsValue, JsValue> {
    let config: SessionConfig = if config.is_undefined() || config.is_null() {
        SessionConfig::default()
    } else {
        from_value(config).map_err(JsValue::from)?
    };
    let session = GameSession::new(config).map_err(config_error_to_js)?;
    to_value(&session).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "playerMove")]
pub fn player_move(session: JsValue, index: usize) -> Result<JsValue, JsValue> {
    let mut session: GameSession = from_value(session).map_err(JsValue::from)?;
    let mut engine = RuleEngine::new();
    match engine.play_move(&mut session, index) {
        Ok(outcome) => to_value(&MoveResponse {
            outcome,
            state: session,
        })
        .map_err(JsValue::from),
        Err(error) => Err(to_js_error(error)),
    }
}

#[wasm_bindgen(js_name = "computerTurn")]
pub fn computer_turn(session: JsValue) -> Result<JsValue, JsValue> {
    let mut session: GameSession = from_value(session).map_err(JsValue::from)?;
    let mut engine = RuleEngine::new();
    match engine.computer_turn(&mut session) {
        Ok(reply) => to_value(&ComputerMoveResponse {
            index: reply.index,
            policy: reply.policy,
            outcome: reply.outcome,
            state: session,
        })
        .map_err(JsValue::from),
        Err(error) => Err(to_js_error(error)),
    }
}

#[wasm_bindgen(js_name = "resetSession")]
pub fn reset_session(session: JsValue) -> Result<JsValue, JsValue> {
    let mut session: GameSession = from_value(session).map_err(JsValue::from)?;
    session.reset();
    to_value(&session).map_err(JsValue::from)
}
