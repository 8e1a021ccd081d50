//! Draws a [`RenderSnapshot`] onto a canvas
//!
//! Layout is in the 800x600 screen space the simulation uses; smaller or
//! larger canvases are clipped, not scaled.

use super::canvas::Canvas;
use super::colors::{self, Color};
use super::snapshot::{AgentView, Overlay, RenderSnapshot};
use crate::simulation::results::Winner;

const CAR_WIDTH: i32 = 30;
const CAR_HEIGHT: i32 = 50;
const ROAD_WIDTH: i32 = 50;
const BAR_WIDTH: i32 = 200;
const BAR_HEIGHT: i32 = 20;

pub fn draw(canvas: &mut Canvas, snapshot: &RenderSnapshot) {
    canvas.clear(colors::BACKGROUND);
    draw_road(canvas);
    draw_car(canvas, &snapshot.player);
    draw_car(canvas, &snapshot.opponent);
    draw_hud(canvas, snapshot);

    match snapshot.overlay {
        Overlay::None => {}
        Overlay::Countdown { count } => draw_countdown(canvas, count),
        Overlay::RoundEnd {
            winner,
            seconds_left,
            final_round,
        } => draw_round_end(canvas, snapshot, winner, seconds_left, final_round),
        Overlay::Complete => draw_complete(canvas, snapshot),
    }
}

fn draw_road(canvas: &mut Canvas) {
    // Outer lanes up to the merge point, then the shared center lane
    canvas.fill_rect(175, 300, ROAD_WIDTH, 300, colors::ROAD);
    canvas.fill_rect(575, 300, ROAD_WIDTH, 300, colors::ROAD);
    canvas.fill_rect(375, 0, ROAD_WIDTH, 300, colors::ROAD);

    for i in 0..6 {
        let y = 350 + i * 50;
        canvas.fill_rect(197, y, 6, 20, colors::MARKING);
        canvas.fill_rect(597, y, 6, 20, colors::MARKING);
    }
    for i in 0..6 {
        canvas.fill_rect(397, 50 + i * 50, 6, 20, colors::MARKING);
    }

    // Finish line
    canvas.fill_rect(350, 50, 100, 5, colors::TEXT);
}

fn draw_car(canvas: &mut Canvas, car: &AgentView) {
    let x = car.x.round() as i32;
    let y = car.y.round() as i32;
    let left = x - CAR_WIDTH / 2;
    let top = y - CAR_HEIGHT / 2;

    canvas.fill_rect(left, top, CAR_WIDTH, CAR_HEIGHT, colors::side_color(car.side));
    canvas.fill_rect(left + 5, top + 5, CAR_WIDTH - 10, 15, colors::WINDSHIELD);
}

fn draw_hud(canvas: &mut Canvas, snapshot: &RenderSnapshot) {
    let score = format!(
        "SCORE: {} - {}",
        snapshot.player_score, snapshot.opponent_score
    );
    canvas.text(20, 20, &score, 2, colors::TEXT);

    let round = format!("ROUND: {}/{}", snapshot.round, snapshot.total_rounds);
    canvas.text(20, 50, &round, 2, colors::TEXT);

    let player = &snapshot.player;
    let opponent = &snapshot.opponent;
    canvas.text(
        20,
        80,
        &format!("PLAYER SPEED: {} KM/H", player.speed as i32),
        2,
        colors::side_text_color(player.side),
    );
    canvas.text(
        20,
        110,
        &format!("OPPONENT SPEED: {} KM/H", opponent.speed as i32),
        2,
        colors::side_text_color(opponent.side),
    );

    draw_progress_bar(canvas, 20, 150, player.progress, colors::side_color(player.side));
    draw_progress_bar(canvas, 20, 180, opponent.progress, colors::side_color(opponent.side));

    canvas.text(20, 550, "PRESS 2/3/4/5 TO SET SPEED", 2, colors::TEXT);
}

fn draw_progress_bar(canvas: &mut Canvas, x: i32, y: i32, progress: f32, color: Color) {
    let progress = progress.clamp(0.0, 100.0);
    canvas.fill_rect(x, y, BAR_WIDTH, BAR_HEIGHT, colors::BAR_BACKGROUND);

    let filled = (BAR_WIDTH as f32 * progress / 100.0) as i32;
    canvas.fill_rect(x, y, filled, BAR_HEIGHT, color);
    canvas.stroke_rect(x, y, BAR_WIDTH, BAR_HEIGHT, 1, colors::TEXT);

    let label = format!("{}%", progress as i32);
    canvas.text_centered(x + BAR_WIDTH / 2, y + BAR_HEIGHT / 2, &label, 2, colors::TEXT);
}

fn draw_countdown(canvas: &mut Canvas, count: u8) {
    canvas.fill_circle(400, 300, 40, colors::MARKING);
    canvas.stroke_circle(400, 300, 40, 2, colors::TEXT);
    canvas.text_centered(400, 300, &count.to_string(), 6, colors::TEXT);
}

fn draw_panel(canvas: &mut Canvas) {
    canvas.fill_rect(200, 250, 400, 150, colors::PANEL);
    canvas.stroke_rect(200, 250, 400, 150, 2, colors::TEXT);
}

fn draw_round_end(
    canvas: &mut Canvas,
    snapshot: &RenderSnapshot,
    winner: Winner,
    seconds_left: f32,
    final_round: bool,
) {
    draw_panel(canvas);

    let title = match winner {
        Winner::Player => "YOU WIN!",
        Winner::Opponent => "OPPONENT WINS!",
        Winner::Tie => "TIE!",
    };
    canvas.text_centered(400, 280, title, 4, colors::winner_color(winner));

    canvas.text(
        250,
        315,
        &format!("YOUR SPEED: {} KM/H", snapshot.player.speed as i32),
        2,
        colors::TEXT,
    );
    canvas.text(
        250,
        340,
        &format!("OPPONENT SPEED: {} KM/H", snapshot.opponent.speed as i32),
        2,
        colors::TEXT,
    );

    let next = if final_round {
        "EXPERIMENT ENDING...".to_string()
    } else {
        format!("NEXT ROUND IN {}S...", seconds_left as i32)
    };
    canvas.text_centered(400, 380, &next, 2, colors::TEXT);
}

fn draw_complete(canvas: &mut Canvas, snapshot: &RenderSnapshot) {
    draw_panel(canvas);
    canvas.text_centered(400, 290, "EXPERIMENT COMPLETE", 3, colors::TEXT);
    let score = format!(
        "FINAL SCORE: {} - {}",
        snapshot.player_score, snapshot.opponent_score
    );
    canvas.text_centered(400, 350, &score, 2, colors::TEXT);
}
