//! Fly Swat entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, MouseEvent};

    use fly_swat::Settings;
    use fly_swat::consts::TIMER_PERIOD_MS;
    use fly_swat::ranking::{self, RankingEntry};
    use fly_swat::sim::{Difficulty, GamePhase, GameState, TickGate, step};

    /// Game instance holding all state
    ///
    /// Single-writer discipline: the elapsed timer, the frame callback and
    /// the click handler each take one short `borrow_mut` per update, and
    /// no borrow is held across an await or a callback re-arm.
    struct Game {
        state: GameState,
        gate: TickGate,
        /// Session generation. Bumped on every transition out of Running;
        /// callbacks armed for an older generation return without re-arming,
        /// so a stale frame or timer can never touch a newer session.
        generation: u64,
        /// requestAnimationFrame timestamp of the previous frame
        last_frame_ms: f64,
        /// Date::now() at the previous elapsed-timer fire
        last_timer_ms: f64,
        /// Interval handle for the elapsed-time timer
        timer_id: Option<i32>,
        rankings: Vec<RankingEntry>,
        /// True while a submission/refresh round trip is in flight
        loading: bool,
    }

    impl Game {
        fn new(seed: u64) -> Self {
            Self {
                state: GameState::new(seed),
                gate: TickGate::new(),
                generation: 0,
                last_frame_ms: 0.0,
                last_timer_ms: 0.0,
                timer_id: None,
                rankings: Vec::new(),
                loading: false,
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Fly Swat starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed)));

        // Prefill the start form: URL query wins, remembered inputs second
        let settings = Settings::load();
        prefill_form(&document, &settings);

        setup_start_buttons(game.clone());
        setup_field_clicks(game.clone());
        setup_difficulty_change(game.clone());
        setup_home_button();

        update_hud(&game.borrow());

        // Initial leaderboard for the preselected difficulty
        let difficulty = selected_difficulty(&document).unwrap_or(settings.difficulty);
        refresh_rankings(game.clone(), difficulty);

        log::info!("Fly Swat ready (seed {})", seed);
    }

    // --- Form helpers ---

    fn query_params() -> Option<web_sys::UrlSearchParams> {
        let search = web_sys::window()?.location().search().ok()?;
        web_sys::UrlSearchParams::new_with_str(&search).ok()
    }

    fn prefill_form(document: &Document, settings: &Settings) {
        let params = query_params();

        let name = params
            .as_ref()
            .and_then(|p| p.get("username"))
            .unwrap_or_else(|| settings.player.clone());
        if let Some(input) = document.get_element_by_id("player-name") {
            if let Ok(input) = input.dyn_into::<web_sys::HtmlInputElement>() {
                input.set_value(&name);
            }
        }

        let difficulty = params
            .as_ref()
            .and_then(|p| p.get("difficulty"))
            .and_then(|v| Difficulty::from_str(&v))
            .unwrap_or(settings.difficulty);
        if let Some(select) = document.get_element_by_id("difficulty") {
            if let Ok(select) = select.dyn_into::<web_sys::HtmlSelectElement>() {
                select.set_value(difficulty.as_str());
            }
        }
    }

    fn player_name(document: &Document) -> String {
        document
            .get_element_by_id("player-name")
            .and_then(|el| el.dyn_into::<web_sys::HtmlInputElement>().ok())
            .map(|input| input.value().trim().to_string())
            .unwrap_or_default()
    }

    fn selected_difficulty(document: &Document) -> Option<Difficulty> {
        document
            .get_element_by_id("difficulty")
            .and_then(|el| el.dyn_into::<web_sys::HtmlSelectElement>().ok())
            .and_then(|select| Difficulty::from_str(&select.value()))
    }

    // --- Session lifecycle ---

    fn start_session(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        let name = player_name(&document);
        if name.is_empty() {
            let _ = window.alert_with_message("Enter your name to start");
            return;
        }
        let Some(difficulty) = selected_difficulty(&document) else {
            let _ = window.alert_with_message("Pick a difficulty");
            return;
        };

        {
            let mut g = game.borrow_mut();
            if !g.state.start(&name, difficulty) {
                return;
            }
            // New session generation: anything armed before this is stale
            g.generation += 1;
            g.gate.reset();
            g.last_frame_ms = 0.0;
            g.last_timer_ms = js_sys::Date::now();
        }

        Settings {
            player: name,
            difficulty,
        }
        .save();

        render_field(&document, &game.borrow().state);
        update_hud(&game.borrow());

        arm_timer(game.clone());
        arm_frame_loop(game);
    }

    /// Tear down the finished session's callbacks, then submit the result
    /// and refresh the leaderboard (sequenced, with a loading window).
    fn finish_session(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        let (submission, difficulty) = {
            let mut g = game.borrow_mut();
            g.generation += 1;
            if let Some(id) = g.timer_id.take() {
                window.clear_interval_with_handle(id);
            }
            g.loading = true;
            (g.state.take_submission(), g.state.difficulty)
        };

        update_hud(&game.borrow());
        render_rankings(&document, &game.borrow());

        wasm_bindgen_futures::spawn_local(async move {
            if let Some(record) = submission {
                if let Err(e) = ranking::submit_time(&record).await {
                    log::warn!("Failed to record completion time: {:?}", e);
                }
            }
            // Refresh only after the submission settled, success or not
            let entries = ranking::fetch_rankings(difficulty).await;
            {
                let mut g = game.borrow_mut();
                g.rankings = entries;
                g.loading = false;
            }
            let document = web_sys::window().unwrap().document().unwrap();
            render_rankings(&document, &game.borrow());
        });
    }

    // --- Timer and frame loop ---

    fn arm_timer(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();

        // A previous session's interval must be gone before arming a new one
        if let Some(id) = game.borrow_mut().timer_id.take() {
            window.clear_interval_with_handle(id);
        }

        let armed_gen = game.borrow().generation;
        let cb_game = game.clone();
        let closure = Closure::<dyn FnMut()>::new(move || {
            let mut g = cb_game.borrow_mut();
            if g.generation != armed_gen || g.state.phase != GamePhase::Running {
                return;
            }
            let now = js_sys::Date::now();
            let delta_secs = ((now - g.last_timer_ms) / 1000.0) as f32;
            g.last_timer_ms = now;
            g.state.accrue_time(delta_secs);
        });

        match window.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            TIMER_PERIOD_MS,
        ) {
            Ok(id) => game.borrow_mut().timer_id = Some(id),
            Err(e) => log::error!("Failed to arm elapsed timer: {:?}", e),
        }
        closure.forget();
    }

    fn arm_frame_loop(game: Rc<RefCell<Game>>) {
        let armed_gen = game.borrow().generation;
        request_frame(game, armed_gen);
    }

    fn request_frame(game: Rc<RefCell<Game>>, armed_gen: u64) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            frame(game, armed_gen, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame(game: Rc<RefCell<Game>>, armed_gen: u64, time: f64) {
        {
            let mut g = game.borrow_mut();
            // Stale frame from a torn-down session: stop the chain here
            if g.generation != armed_gen || g.state.phase != GamePhase::Running {
                return;
            }

            let delta_ms = if g.last_frame_ms > 0.0 {
                (time - g.last_frame_ms) as f32
            } else {
                0.0
            };
            g.last_frame_ms = time;

            if let Some(step_ms) = g.gate.feed(delta_ms) {
                step(&mut g.state, step_ms);
            }
        }

        let document = web_sys::window().unwrap().document().unwrap();
        render_field(&document, &game.borrow().state);
        update_hud(&game.borrow());

        request_frame(game, armed_gen);
    }

    // --- Input handlers ---

    fn setup_start_buttons(game: Rc<RefCell<Game>>) {
        let document = web_sys::window().unwrap().document().unwrap();

        for id in ["start-btn", "play-again-btn"] {
            if let Some(btn) = document.get_element_by_id(id) {
                let game = game.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                    start_session(game.clone());
                });
                let _ =
                    btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }
    }

    /// One delegated listener on the field catches every fly click,
    /// including flies spawned by later sessions.
    fn setup_field_clicks(game: Rc<RefCell<Game>>) {
        let document = web_sys::window().unwrap().document().unwrap();
        let Some(field) = document.get_element_by_id("field") else {
            log::error!("Missing #field element");
            return;
        };

        let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
            let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
                return;
            };
            let Some(id) = target
                .get_attribute("data-fly-id")
                .and_then(|v| v.parse::<u32>().ok())
            else {
                return;
            };

            let completed = game.borrow_mut().state.catch(id);

            let document = web_sys::window().unwrap().document().unwrap();
            render_field(&document, &game.borrow().state);
            update_hud(&game.borrow());

            if completed {
                finish_session(game.clone());
            }
        });
        let _ = field.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_difficulty_change(game: Rc<RefCell<Game>>) {
        let document = web_sys::window().unwrap().document().unwrap();
        if let Some(select) = document.get_element_by_id("difficulty") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let document = web_sys::window().unwrap().document().unwrap();
                if let Some(difficulty) = selected_difficulty(&document) {
                    refresh_rankings(game.clone(), difficulty);
                }
            });
            let _ =
                select.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_home_button() {
        let document = web_sys::window().unwrap().document().unwrap();
        if let Some(btn) = document.get_element_by_id("home-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                if let Some(window) = web_sys::window() {
                    let _ = window.location().set_href("./");
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    // --- Rendering ---

    fn refresh_rankings(game: Rc<RefCell<Game>>, difficulty: Difficulty) {
        game.borrow_mut().loading = true;
        {
            let document = web_sys::window().unwrap().document().unwrap();
            render_rankings(&document, &game.borrow());
        }

        wasm_bindgen_futures::spawn_local(async move {
            let entries = ranking::fetch_rankings(difficulty).await;
            {
                let mut g = game.borrow_mut();
                g.rankings = entries;
                g.loading = false;
            }
            let document = web_sys::window().unwrap().document().unwrap();
            render_rankings(&document, &game.borrow());
        });
    }

    /// Keep one sprite per live fly, positioned at its percentage coords
    fn render_field(document: &Document, state: &GameState) {
        let Some(field) = document.get_element_by_id("field") else {
            return;
        };

        // Drop sprites whose fly was caught (or from an older session)
        let children = field.children();
        let mut stale: Vec<Element> = Vec::new();
        for i in 0..children.length() {
            if let Some(el) = children.item(i) {
                let live = el
                    .get_attribute("data-fly-id")
                    .and_then(|v| v.parse::<u32>().ok())
                    .map(|id| state.flies.iter().any(|f| f.id == id))
                    .unwrap_or(false);
                if !live {
                    stale.push(el);
                }
            }
        }
        for el in stale {
            el.remove();
        }

        for fly in &state.flies {
            let selector = format!("[data-fly-id='{}']", fly.id);
            let sprite = match field.query_selector(&selector) {
                Ok(Some(el)) => el,
                _ => {
                    let Ok(el) = document.create_element("button") else {
                        continue;
                    };
                    let _ = el.set_attribute("class", "fly");
                    let _ = el.set_attribute("data-fly-id", &fly.id.to_string());
                    el.set_text_content(Some("\u{1FAB0}"));
                    let _ = field.append_child(&el);
                    el
                }
            };
            let _ = sprite.set_attribute(
                "style",
                &format!("left: {:.2}%; top: {:.2}%;", fly.pos.x, fly.pos.y),
            );
        }
    }

    /// Update HUD values and panel visibility from current state
    fn update_hud(g: &Game) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        if let Some(el) = document
            .query_selector("#hud-player .hud-value")
            .ok()
            .flatten()
        {
            el.set_text_content(Some(&g.state.player));
        }
        if let Some(el) = document
            .query_selector("#hud-time .hud-value")
            .ok()
            .flatten()
        {
            el.set_text_content(Some(&format!("{:.1}s", g.state.elapsed_secs)));
        }
        if let Some(el) = document
            .query_selector("#hud-left .hud-value")
            .ok()
            .flatten()
        {
            el.set_text_content(Some(&g.state.flies_left().to_string()));
        }

        // Start form only while idle
        if let Some(el) = document.get_element_by_id("start-panel") {
            let class = if g.state.phase == GamePhase::Idle {
                "panel"
            } else {
                "panel hidden"
            };
            let _ = el.set_attribute("class", class);
        }

        // Completion overlay
        if let Some(el) = document.get_element_by_id("game-over") {
            if g.state.phase == GamePhase::Complete {
                let _ = el.set_attribute("class", "panel");
                if let Some(time_el) = document.get_element_by_id("final-time") {
                    time_el.set_text_content(Some(&format!("{:.1}s", g.state.elapsed_secs)));
                }
            } else {
                let _ = el.set_attribute("class", "panel hidden");
            }
        }
    }

    fn render_rankings(document: &Document, g: &Game) {
        if let Some(el) = document.get_element_by_id("rankings-loading") {
            let _ = el.set_attribute("class", if g.loading { "" } else { "hidden" });
        }

        let Some(list) = document.get_element_by_id("rankings") else {
            return;
        };
        list.set_inner_html("");

        if g.loading {
            return;
        }

        if g.rankings.is_empty() {
            let Ok(row) = document.create_element("div") else {
                return;
            };
            let _ = row.set_attribute("class", "rank-row empty");
            row.set_text_content(Some("No records yet"));
            let _ = list.append_child(&row);
            return;
        }

        for entry in &g.rankings {
            let Ok(row) = document.create_element("div") else {
                continue;
            };
            let class = if entry.username == g.state.player {
                "rank-row own"
            } else {
                "rank-row"
            };
            let _ = row.set_attribute("class", class);
            row.set_text_content(Some(&format!(
                "{}. {}  {:.1}s",
                entry.rank, entry.username, entry.time
            )));
            let _ = list.append_child(&row);
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Fly Swat (native) starting...");
    log::info!("Native mode is headless - run with `trunk serve` for the browser version");

    run_headless_session();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Play one seeded session to completion without a browser
#[cfg(not(target_arch = "wasm32"))]
fn run_headless_session() {
    use fly_swat::sim::{Difficulty, GamePhase, GameState, step};

    let mut state = GameState::new(42);
    assert!(state.start("smoke", Difficulty::Easy));

    // A few seconds of simulated frames
    for _ in 0..180 {
        state.accrue_time(0.016);
        step(&mut state, 16.0);
    }

    let ids: Vec<u32> = state.flies.iter().map(|f| f.id).collect();
    for id in ids {
        state.catch(id);
    }
    assert_eq!(state.phase, GamePhase::Complete);

    if let Some(record) = state.take_submission() {
        if let Err(e) = fly_swat::ranking::submit_time(&record) {
            log::warn!("Submit failed: {}", e);
        }
    }

    println!("✓ Headless session complete in {:.1}s", state.elapsed_secs);
}
