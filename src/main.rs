use std::io::Write;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use chess3d::ai::{AiEngine, MinimaxAi};
use chess3d::config::AppConfig;
use chess3d::engine::{Color, Difficulty, Game, Move, MoveRequest, MoveResult, Square};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Selfplay stops here if neither side has won or drawn.
const SELFPLAY_MAX_PLIES: usize = 300;

const HELP: &str = "\
commands:
  e2e4, e7e8q, Nf3   play a move (coordinates or SAN)
  undo               take back your last move and the reply
  hint               suggest a move
  moves <square>     list destinations from a square
  board | fen | pgn | captured
  difficulty <1-6>   change the AI level
  new                start over
  quit";

#[tokio::main]
async fn main() {
    // Initialize tracing (structured logging).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chess3d=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env();
    info!(
        difficulty = %config.difficulty,
        rules = %config.rules,
        player = %config.player_color,
        "chess3d v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let result = if std::env::args().any(|a| a == "--selfplay") {
        selfplay(&config).await
    } else {
        Session::new(&config).run().await
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn new_ai(config: &AppConfig, difficulty: Difficulty) -> MinimaxAi {
    match config.ai_seed {
        Some(seed) => MinimaxAi::with_seed(difficulty, seed),
        None => MinimaxAi::new(difficulty),
    }
}

/// Run the search off the async runtime, waiting at least `delay`.
async fn think(
    mut ai: MinimaxAi,
    game: Game,
    delay: Duration,
) -> Result<(MinimaxAi, Option<Move>), BoxError> {
    let search = tokio::task::spawn_blocking(move || {
        let mv = ai.best_move(&game);
        (ai, mv)
    });
    tokio::time::sleep(delay).await;
    Ok(search.await?)
}

fn describe(result: &MoveResult) -> String {
    let mut line = format!("{} {}", result.color, result.san);
    if let Some(kind) = result.captured {
        line.push_str(&format!(" (takes {kind})"));
    }
    line
}

fn announce_status(game: &Game) {
    let status = game.status();
    if status.is_game_over() || game.in_check() {
        println!("status: {status}");
    }
}

// =========================================================================
// Human vs AI
// =========================================================================

struct Session<'a> {
    config: &'a AppConfig,
    game: Game,
    ai: Option<MinimaxAi>,
    player: Color,
}

impl<'a> Session<'a> {
    fn new(config: &'a AppConfig) -> Self {
        let mut game = Game::with_rules(config.rules);
        match config.player_color {
            Color::White => game.black_player = "chess3d".into(),
            Color::Black => game.white_player = "chess3d".into(),
        }
        Session {
            config,
            game,
            ai: Some(new_ai(config, config.difficulty)),
            player: config.player_color,
        }
    }

    async fn run(mut self) -> Result<(), BoxError> {
        println!("{HELP}\n");
        println!("{}", self.game.position());

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            if self.game.turn() != self.player && !self.game.is_game_over() {
                self.ai_turn().await?;
            }

            print!("{}> ", self.game.turn());
            std::io::stdout().flush()?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            if input == "quit" || input == "exit" {
                break;
            }
            self.command(input).await?;
        }
        Ok(())
    }

    async fn ai_turn(&mut self) -> Result<(), BoxError> {
        let Some(ai) = self.ai.take() else {
            return Ok(());
        };
        println!("thinking...");
        let delay = Duration::from_millis(self.config.ai_delay_ms);
        let (ai, mv) = think(ai, self.game.clone(), delay).await?;
        self.ai = Some(ai);

        let Some(mv) = mv else {
            return Ok(());
        };
        match self.game.try_move(&MoveRequest::from(mv)) {
            Ok(result) => {
                println!("{}", describe(&result));
                println!("{}", self.game.position());
                announce_status(&self.game);
            }
            Err(e) => warn!(%mv, "AI move rejected: {e}"),
        }
        Ok(())
    }

    async fn command(&mut self, input: &str) -> Result<(), BoxError> {
        let mut words = input.split_whitespace();
        let head = words.next().unwrap_or_default();
        let arg = words.next();

        match (head, arg) {
            ("help", _) => println!("{HELP}"),
            ("board", _) => println!("{}", self.game.position()),
            ("fen", _) => println!("{}", self.game.fen()),
            ("pgn", _) => print!("{}", self.game.pgn()),
            ("new", _) => {
                self.game.reset();
                println!("{}", self.game.position());
            }
            ("undo", _) => self.undo(),
            ("hint", _) => self.hint().await?,
            ("captured", _) => {
                let captured = self.game.captured_pieces();
                println!("white lost: {:?}", captured.white);
                println!("black lost: {:?}", captured.black);
                let material = self.game.material_count();
                println!("material: white {} black {}", material.white, material.black);
            }
            ("moves", Some(square)) => match square.parse::<Square>() {
                Ok(sq) => {
                    let targets: Vec<String> = self
                        .game
                        .move_targets(sq)
                        .iter()
                        .map(|s| s.to_algebraic())
                        .collect();
                    println!("{sq}: {}", targets.join(" "));
                }
                Err(e) => println!("{e}"),
            },
            ("difficulty", Some(level)) => match Difficulty::from_str_loose(level) {
                Some(difficulty) => {
                    if let Some(ai) = self.ai.as_mut() {
                        ai.set_difficulty(difficulty);
                    }
                    println!("difficulty: {difficulty} (depth {})", difficulty.depth());
                }
                None => println!("difficulty must be 1-6"),
            },
            _ => self.player_move(input),
        }
        Ok(())
    }

    fn player_move(&mut self, input: &str) {
        let attempt = match MoveRequest::parse(input) {
            Ok(request) => self.game.try_move(&request),
            Err(_) => self.game.try_move_san(input),
        };
        match attempt {
            Ok(result) => {
                println!("{}", describe(&result));
                announce_status(&self.game);
            }
            Err(e) => println!("illegal: {e}"),
        }
    }

    /// Take back the player's last move together with the AI reply.
    fn undo(&mut self) {
        if self.game.undo().is_none() {
            println!("nothing to undo");
            return;
        }
        if self.game.turn() != self.player {
            self.game.undo();
        }
        println!("{}", self.game.position());
    }

    async fn hint(&mut self) -> Result<(), BoxError> {
        let Some(ai) = self.ai.take() else {
            return Ok(());
        };
        let (ai, mv) = think(ai, self.game.clone(), Duration::ZERO).await?;
        self.ai = Some(ai);
        match mv {
            Some(mv) => println!("hint: {mv}"),
            None => println!("no legal moves"),
        }
        Ok(())
    }
}

// =========================================================================
// AI vs AI
// =========================================================================

async fn selfplay(config: &AppConfig) -> Result<(), BoxError> {
    let mut game = Game::with_rules(config.rules);
    game.white_player = "chess3d".into();
    game.black_player = "chess3d".into();
    let mut ai = new_ai(config, config.difficulty);
    let delay = Duration::from_millis(config.ai_delay_ms);

    while !game.is_game_over() && game.history().len() < SELFPLAY_MAX_PLIES {
        let (back, mv) = think(ai, game.clone(), delay).await?;
        ai = back;
        let Some(mv) = mv else {
            break;
        };
        let result = game.try_move(&MoveRequest::from(mv))?;
        println!("{}", describe(&result));
    }

    info!(status = %game.status(), plies = game.history().len(), "selfplay finished");
    println!("{}", game.position());
    print!("{}", game.pgn());
    Ok(())
}
