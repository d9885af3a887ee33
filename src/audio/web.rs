//! Web Audio playback
//!
//! Browsers keep the context suspended until a user gesture; `unlock` is
//! called on every key press until it succeeds.

use wasm_bindgen::prelude::*;
use web_sys::{AudioContext, AudioContextState, GainNode, OscillatorNode, OscillatorType};

use super::ResumeGate;
use crate::error::GameError;
use crate::settings::Settings;
use crate::sim::{EnemyKind, GameEvent};

/// Plays a cue for each drained simulation event
pub struct AudioManager {
    ctx: Option<AudioContext>,
    volume: f32,
    gate: ResumeGate,
    on_resumed: Closure<dyn FnMut(JsValue)>,
    on_rejected: Closure<dyn FnMut(JsValue)>,
}

impl AudioManager {
    pub fn new(settings: &Settings) -> Self {
        // May fail outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        let gate = ResumeGate::default();
        let on_resumed = {
            let gate = gate.clone();
            Closure::<dyn FnMut(JsValue)>::new(move |_: JsValue| gate.finish())
        };
        let on_rejected = {
            let gate = gate.clone();
            Closure::<dyn FnMut(JsValue)>::new(move |err: JsValue| {
                gate.finish();
                log::warn!("{}", GameError::AudioRejected(format!("{err:?}")));
            })
        };
        Self {
            ctx,
            volume: settings.effective_volume(),
            gate,
            on_resumed,
            on_rejected,
        }
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.volume = settings.effective_volume();
    }

    /// Try to leave the suspended state
    ///
    /// At most one resume is in flight. A rejected resume is logged and left
    /// suspended; the next input tries again.
    pub fn unlock(&self) {
        let Some(ctx) = &self.ctx else { return };
        if ctx.state() != AudioContextState::Suspended || !self.gate.begin() {
            return;
        }
        match ctx.resume() {
            Ok(promise) => {
                let _ = promise.then2(&self.on_resumed, &self.on_rejected);
            }
            Err(err) => {
                self.gate.finish();
                log::warn!("{}", GameError::AudioRejected(format!("{err:?}")));
            }
        }
    }

    /// Play the cue for one event
    pub fn play(&self, event: &GameEvent) {
        let vol = self.volume;
        if vol <= 0.0 {
            return;
        }
        let Some(ctx) = &self.ctx else { return };
        if ctx.state() != AudioContextState::Running {
            return;
        }

        match *event {
            GameEvent::ShotFired => self.play_shot(ctx, vol),
            GameEvent::EnemyDied { kind } if kind == EnemyKind::Boss => {
                self.play_boss_down(ctx, vol)
            }
            GameEvent::EnemyDied { kind } => self.play_enemy_down(ctx, vol, kind.is_elite()),
            GameEvent::PlayerHit { damage } => self.play_hurt(ctx, vol, damage),
            GameEvent::PickupCollected { .. } => self.play_pickup(ctx, vol),
            GameEvent::LevelUp { .. } => self.play_level_up(ctx, vol),
            GameEvent::GameOver => self.play_game_over(ctx, vol),
        }
    }

    /// Create an oscillator with gain envelope
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// One enveloped blip, optionally sweeping to `end_freq`
    fn blip(
        &self,
        ctx: &AudioContext,
        start: f64,
        (freq, end_freq): (f32, Option<f32>),
        osc_type: OscillatorType,
        peak: f32,
        length: f64,
    ) {
        let Some((osc, gain)) = self.create_osc(ctx, freq, osc_type) else {
            return;
        };
        gain.gain().set_value_at_time(peak, start).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, start + length)
            .ok();
        if let Some(end) = end_freq {
            osc.frequency().set_value_at_time(freq, start).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(end, start + length)
                .ok();
        }
        osc.start_with_when(start).ok();
        osc.stop_with_when(start + length + 0.05).ok();
    }

    /// Auto-shot - short rising chirp, kept quiet since it repeats
    fn play_shot(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();
        self.blip(
            ctx,
            t,
            (520.0, Some(880.0)),
            OscillatorType::Triangle,
            vol * 0.08,
            0.06,
        );
    }

    fn play_enemy_down(&self, ctx: &AudioContext, vol: f32, elite: bool) {
        let t = ctx.current_time();
        let (freq, peak) = if elite { (260.0, 0.3) } else { (340.0, 0.18) };
        self.blip(
            ctx,
            t,
            (freq, Some(freq * 0.4)),
            OscillatorType::Square,
            vol * peak,
            0.12,
        );
        if elite {
            self.blip(ctx, t, (90.0, None), OscillatorType::Sine, vol * 0.3, 0.15);
        }
    }

    /// Boss down - low boom under a rising triad
    fn play_boss_down(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();
        self.blip(
            ctx,
            t,
            (110.0, Some(30.0)),
            OscillatorType::Sawtooth,
            vol * 0.5,
            0.5,
        );
        for (i, freq) in [440.0, 554.0, 659.0].iter().enumerate() {
            let start = t + 0.15 + i as f64 * 0.1;
            self.blip(ctx, start, (*freq, None), OscillatorType::Triangle, vol * 0.25, 0.35);
        }
    }

    /// Player hit - thud that grows with the damage taken
    fn play_hurt(&self, ctx: &AudioContext, vol: f32, damage: f32) {
        let t = ctx.current_time();
        let weight = (damage / 20.0).clamp(0.3, 1.0);
        self.blip(
            ctx,
            t,
            (180.0, Some(55.0)),
            OscillatorType::Sawtooth,
            vol * 0.45 * weight,
            0.18,
        );
    }

    fn play_pickup(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();
        self.blip(ctx, t, (900.0, None), OscillatorType::Sine, vol * 0.12, 0.08);
        self.blip(ctx, t + 0.04, (1200.0, None), OscillatorType::Sine, vol * 0.12, 0.08);
    }

    /// Level up - bright arpeggio
    fn play_level_up(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();
        for (i, freq) in [523.0, 659.0, 784.0, 1047.0].iter().enumerate() {
            let start = t + i as f64 * 0.08;
            self.blip(ctx, start, (*freq, None), OscillatorType::Triangle, vol * 0.3, 0.3);
        }
    }

    /// Game over - sad descending
    fn play_game_over(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();
        for (i, freq) in [392.0, 330.0, 262.0, 196.0].iter().enumerate() {
            let start = t + i as f64 * 0.22;
            self.blip(ctx, start, (*freq, None), OscillatorType::Sine, vol * 0.3, 0.35);
        }
    }
}
