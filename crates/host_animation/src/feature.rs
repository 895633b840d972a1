use bevy_log::{debug, warn};
use host_animation_core::prelude::*;
use indexmap::IndexMap;

use crate::{
    events::{
        AnimationEvent, AnimationPayload, AnimationRenamePayload, LayerObserver, LayerPayload,
        RenamePayload,
    },
    layer::{AnimationLayer, LayerOptions},
    state::{AnimationState, BlendValue},
    utils::unique_name,
};

/// The layered animation stack of one host.
///
/// Layers are ordered bottom to top. Each frame, weights are computed from the top layer down:
/// an override layer masks the layers beneath it by the weight its current animation
/// contributes, while additive layers leave them untouched.
#[derive(Default)]
pub struct AnimationFeature {
    layers: IndexMap<String, AnimationLayer>,
    observers: Vec<Box<dyn LayerObserver>>,
}

impl AnimationFeature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_observer(&mut self, observer: impl LayerObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn emit(&mut self, event: AnimationEvent) {
        for observer in &mut self.observers {
            observer.on_animation_event(&event);
        }
    }

    fn emit_animation(
        &mut self,
        layer: &str,
        animation: &str,
        build: fn(AnimationPayload) -> AnimationEvent,
    ) {
        self.emit(AnimationEvent::animation(layer, animation, build));
    }

    fn missing_layer(name: &str) -> AnimationError {
        AnimationError::MissingLayer(name.to_string())
    }

    fn layer_or_err(&self, name: &str) -> AnimationResult<&AnimationLayer> {
        self.layers.get(name).ok_or_else(|| Self::missing_layer(name))
    }

    fn layer_mut_or_err(&mut self, name: &str) -> AnimationResult<&mut AnimationLayer> {
        self.layers
            .get_mut(name)
            .ok_or_else(|| Self::missing_layer(name))
    }

    // Introspection

    /// Layer names, bottom first.
    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    pub fn layer(&self, name: &str) -> Option<&AnimationLayer> {
        self.layers.get(name)
    }

    pub fn layer_mut(&mut self, name: &str) -> Option<&mut AnimationLayer> {
        self.layers.get_mut(name)
    }

    pub fn animation(&self, layer: &str, animation: &str) -> Option<&AnimationState> {
        self.layers.get(layer)?.state(animation)
    }

    pub fn current_animation(&self, layer: &str) -> Option<&str> {
        self.layers.get(layer)?.current_name()
    }

    // Layers

    /// Inserts a layer at `index` (bottom is 0), or on top when no index is given. An out of range
    /// index also appends. Returns the final, unique layer name.
    pub fn add_layer(&mut self, name: &str, options: LayerOptions, index: Option<usize>) -> String {
        let unique = unique_name(name, |n| self.layers.contains_key(n));
        if unique != name {
            warn!("Layer {:?} already exists, renamed to {:?}", name, unique);
        }

        let len = self.layers.len();
        let index = match index {
            Some(index) if index <= len => index,
            Some(index) => {
                warn!(
                    "Layer index {} is out of range for {} layers, appending {:?}",
                    index, len, unique
                );
                len
            }
            None => len,
        };
        self.layers.shift_insert(
            index,
            unique.clone(),
            AnimationLayer::new(unique.clone(), options),
        );

        self.emit(AnimationEvent::AddLayer(LayerPayload {
            name: unique.clone(),
            index,
        }));
        unique
    }

    pub fn remove_layer(&mut self, name: &str) -> AnimationResult<()> {
        let (index, _, mut layer) = self
            .layers
            .shift_remove_full(name)
            .ok_or_else(|| Self::missing_layer(name))?;
        layer.discard();

        self.emit(AnimationEvent::RemoveLayer(LayerPayload {
            name: name.to_string(),
            index,
        }));
        Ok(())
    }

    /// Moves a layer to `index`. An out of range index leaves the stack unchanged.
    pub fn move_layer(&mut self, name: &str, index: usize) -> AnimationResult<()> {
        let from = self
            .layers
            .get_index_of(name)
            .ok_or_else(|| Self::missing_layer(name))?;
        if index >= self.layers.len() {
            warn!(
                "Layer index {} is out of range for {} layers, not moving {:?}",
                index,
                self.layers.len(),
                name
            );
            return Ok(());
        }
        self.layers.move_index(from, index);
        Ok(())
    }

    /// Renames a layer in place. Returns the final, unique name.
    pub fn rename_layer(&mut self, old: &str, new: &str) -> AnimationResult<String> {
        if old == new {
            self.layer_or_err(old)?;
            return Ok(new.to_string());
        }
        let (index, _, mut layer) = self
            .layers
            .shift_remove_full(old)
            .ok_or_else(|| Self::missing_layer(old))?;

        let unique = unique_name(new, |n| self.layers.contains_key(n));
        if unique != new {
            warn!("Layer {:?} already exists, renamed to {:?}", new, unique);
        }
        layer.set_name(unique.clone());
        self.layers.shift_insert(index, unique.clone(), layer);

        self.emit(AnimationEvent::RenameLayer(RenamePayload {
            old_name: old.to_string(),
            new_name: unique.clone(),
        }));
        Ok(unique)
    }

    // Animations

    pub fn add_animation(
        &mut self,
        layer: &str,
        state: impl Into<AnimationState>,
    ) -> AnimationResult<String> {
        let name = self.layer_mut_or_err(layer)?.add_state(state);
        self.emit_animation(layer, &name, AnimationEvent::AddAnimation);
        Ok(name)
    }

    pub fn remove_animation(&mut self, layer: &str, animation: &str) -> AnimationResult<()> {
        self.layer_mut_or_err(layer)?.remove_state(animation)?;
        self.emit_animation(layer, animation, AnimationEvent::RemoveAnimation);
        Ok(())
    }

    pub fn rename_animation(
        &mut self,
        layer: &str,
        old: &str,
        new: &str,
    ) -> AnimationResult<String> {
        let name = self.layer_mut_or_err(layer)?.rename_state(old, new)?;
        self.emit(AnimationEvent::RenameAnimation(AnimationRenamePayload {
            layer_name: layer.to_string(),
            old_name: old.to_string(),
            new_name: name.clone(),
        }));
        Ok(name)
    }

    // Playback

    /// Plays `animation` on `layer`, crossfading from the current animation over `seconds`.
    ///
    /// The returned deferred resolves when the animation finishes on its own, is canceled when
    /// another play pre-empts it, and is rejected if the layer or animation does not exist.
    pub fn play_animation(
        &mut self,
        layer: &str,
        animation: &str,
        seconds: f32,
        easing: Easing,
    ) -> Deferred {
        self.start_animation(layer, Some(animation), seconds, easing, false)
    }

    /// Resumes `animation` (or the current animation) on `layer` from where it was.
    pub fn resume_animation(
        &mut self,
        layer: &str,
        animation: Option<&str>,
        seconds: f32,
        easing: Easing,
    ) -> Deferred {
        self.start_animation(layer, animation, seconds, easing, true)
    }

    fn start_animation(
        &mut self,
        layer_name: &str,
        animation: Option<&str>,
        seconds: f32,
        easing: Easing,
        resume: bool,
    ) -> Deferred {
        let Some(layer) = self.layers.get_mut(layer_name) else {
            warn!("Cannot play on missing layer {:?}", layer_name);
            return Deferred::rejected(Self::missing_layer(layer_name));
        };

        let interrupted = layer.playing_name().map(str::to_string);
        let deferred = if resume {
            layer.resume_animation(animation, seconds, easing)
        } else {
            match animation {
                Some(animation) => layer.play_animation(animation, seconds, easing),
                None => Deferred::rejected(AnimationError::NoCurrentAnimation(
                    layer_name.to_string(),
                )),
            }
        };
        if deferred.is_rejected() {
            if let Some(error) = deferred.error() {
                warn!("Layer {:?} could not start animation: {}", layer_name, error);
            }
            return deferred;
        }
        let started = layer.current_name().map(str::to_string).unwrap_or_default();

        if let Some(interrupted) = interrupted.filter(|name| *name != started) {
            self.emit_animation(layer_name, &interrupted, AnimationEvent::Interrupt);
        }
        let event = if resume {
            AnimationEvent::Resume
        } else {
            AnimationEvent::Play
        };
        self.emit_animation(layer_name, &started, event);
        deferred
    }

    pub fn pause_animation(&mut self, layer: &str) -> bool {
        let Some(target) = self.layers.get_mut(layer) else {
            warn!("Cannot pause missing layer {:?}", layer);
            return false;
        };
        let Some(current) = target.current_name().map(str::to_string) else {
            return false;
        };
        target.pause();
        self.emit_animation(layer, &current, AnimationEvent::Pause);
        true
    }

    pub fn stop_animation(&mut self, layer: &str) -> bool {
        let Some(target) = self.layers.get_mut(layer) else {
            warn!("Cannot stop missing layer {:?}", layer);
            return false;
        };
        let Some(current) = target.current_name().map(str::to_string) else {
            return false;
        };
        if !target.stop() {
            return false;
        }
        self.emit_animation(layer, &current, AnimationEvent::Stop);
        true
    }

    /// Advances a queue to its next child, or makes a random animation pick again.
    pub fn play_next_animation(&mut self, layer: &str, animation: &str) -> Deferred {
        match self.layers.get_mut(layer) {
            Some(target) => target.play_next_animation(animation),
            None => Deferred::rejected(Self::missing_layer(layer)),
        }
    }

    /// Pauses every layer. Returns `true` if any layer had something to pause.
    pub fn pause(&mut self) -> bool {
        let names = self.layers.keys().cloned().collect::<Vec<_>>();
        names
            .iter()
            .fold(false, |paused, name| self.pause_animation(name) || paused)
    }

    /// Resumes every layer that has a current animation.
    ///
    /// The returned deferred settles once every layer's play settles. Canceling it leaves the
    /// layers playing.
    pub fn resume(&mut self) -> Deferred {
        let names = self
            .layers
            .values()
            .filter(|layer| layer.current_name().is_some())
            .map(|layer| layer.name().to_string())
            .collect::<Vec<_>>();
        let resumed = names
            .iter()
            .map(|name| self.resume_animation(name, None, 0., Easing::Linear).follower())
            .collect::<Vec<_>>();
        Deferred::all(resumed)
    }

    // Weights

    pub fn set_layer_weight(
        &mut self,
        layer: &str,
        weight: f32,
        seconds: f32,
        easing: Easing,
    ) -> AnimationResult<Deferred> {
        Ok(self
            .layer_mut_or_err(layer)?
            .set_weight(weight, seconds, easing))
    }

    pub fn layer_weight(&self, layer: &str) -> AnimationResult<f32> {
        Ok(self.layer_or_err(layer)?.weight())
    }

    pub fn set_animation_blend_weight(
        &mut self,
        layer: &str,
        animation: &str,
        state: &str,
        weight: f32,
        seconds: f32,
        easing: Easing,
    ) -> AnimationResult<Deferred> {
        self.layer_mut_or_err(layer)?
            .set_animation_blend_weight(animation, state, weight, seconds, easing)
    }

    pub fn animation_blend_weight(
        &self,
        layer: &str,
        animation: &str,
        state: &str,
    ) -> AnimationResult<f32> {
        self.layer_or_err(layer)?
            .animation_blend_weight(animation, state)
    }

    pub fn set_animation_blend_value(
        &mut self,
        layer: &str,
        animation: &str,
        value: impl Into<BlendValue>,
        seconds: f32,
        easing: Easing,
    ) -> AnimationResult<Deferred> {
        self.layer_mut_or_err(layer)?.set_animation_blend_value(
            animation,
            value.into(),
            seconds,
            easing,
        )
    }

    pub fn animation_blend_value(&self, layer: &str, animation: &str) -> AnimationResult<BlendValue> {
        self.layer_or_err(layer)?.animation_blend_value(animation)
    }

    /// Walks the stack from the top layer down, handing each layer the weight left over by the
    /// override layers above it.
    pub fn update_internal_weights(&mut self) {
        let mut factor = 1.;
        for layer in self.layers.values_mut().rev() {
            layer.update_internal_weight(factor);
            if layer.blend_mode() == BlendMode::Override {
                factor *= 1. - layer.current_internal_weight();
            }
        }
    }

    /// Advances the whole stack by `delta` milliseconds.
    pub fn update(&mut self, delta: f32) {
        self.update_internal_weights();
        for layer in self.layers.values_mut() {
            layer.update(delta);
        }
    }

    /// Discards every layer.
    pub fn clear(&mut self) {
        for (name, mut layer) in self.layers.drain(..) {
            debug!("Discarding layer {:?}", name);
            layer.discard();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::state::{
        Blend1dState, FreeBlendState, QueueState, StateLike, test_support::*,
    };
    use bevy_math::Vec2;

    fn base_feature() -> AnimationFeature {
        let mut feature = AnimationFeature::new();
        feature.add_layer("Base", LayerOptions::default(), None);
        feature.add_animation("Base", clip("idle", 1.)).unwrap();
        feature.add_animation("Base", clip("walk", 1.)).unwrap();
        feature
    }

    fn internal_weight(feature: &AnimationFeature, layer: &str, animation: &str) -> f32 {
        feature
            .animation(layer, animation)
            .map_or(f32::NAN, StateLike::internal_weight)
    }

    #[test]
    fn crossfade_scenario() {
        let mut feature = base_feature();
        feature.play_animation("Base", "idle", 0., Easing::Linear);
        let walk = feature.play_animation("Base", "walk", 1., Easing::Linear);

        feature.update(500.);
        feature.update_internal_weights();
        assert!(approx(internal_weight(&feature, "Base", "idle"), 0.5));
        assert!(approx(internal_weight(&feature, "Base", "walk"), 0.5));

        feature.update(500.);
        feature.update_internal_weights();
        assert!(approx(internal_weight(&feature, "Base", "idle"), 0.));
        assert!(approx(internal_weight(&feature, "Base", "walk"), 1.));
        assert!(walk.is_pending());
    }

    #[test]
    fn override_layer_masks_layers_below() {
        let mut feature = base_feature();
        feature.add_layer(
            "Eyes",
            LayerOptions {
                weight: 0.5,
                ..Default::default()
            },
            None,
        );
        feature.add_animation("Eyes", clip("blink", 1.)).unwrap();

        feature.play_animation("Base", "idle", 0., Easing::Linear);
        feature.play_animation("Eyes", "blink", 0., Easing::Linear);
        feature.update_internal_weights();

        assert!(approx(internal_weight(&feature, "Eyes", "blink"), 0.5));
        assert!(approx(internal_weight(&feature, "Base", "idle"), 0.5));
    }

    #[test]
    fn additive_layer_does_not_mask() {
        let mut feature = base_feature();
        feature.add_layer(
            "Breath",
            LayerOptions {
                blend_mode: BlendMode::Additive,
                weight: 1.,
            },
            None,
        );
        feature.add_animation("Breath", clip("breathe", 1.)).unwrap();

        feature.play_animation("Base", "idle", 0., Easing::Linear);
        feature.play_animation("Breath", "breathe", 0., Easing::Linear);
        feature.update_internal_weights();

        assert!(approx(internal_weight(&feature, "Breath", "breathe"), 1.));
        assert!(approx(internal_weight(&feature, "Base", "idle"), 1.));
    }

    #[test]
    fn blend_1d_clamps_above_range() {
        let mut feature = base_feature();
        let blend = Blend1dState::new(
            "locomotion",
            [clip("slow", 1.), clip("fast", 1.)],
            vec![0., 1.],
            vec![],
        )
        .unwrap();
        feature.add_animation("Base", blend).unwrap();
        feature.play_animation("Base", "locomotion", 0., Easing::Linear);
        feature
            .set_animation_blend_value("Base", "locomotion", 2_f32, 0., Easing::Linear)
            .unwrap();
        feature.update_internal_weights();

        let children = feature
            .animation("Base", "locomotion")
            .and_then(AnimationState::children)
            .unwrap();
        assert_eq!(children.get("slow").unwrap().internal_weight(), 0.);
        assert_eq!(children.get("fast").unwrap().internal_weight(), 1.);
        assert_eq!(
            feature.animation_blend_value("Base", "locomotion"),
            Ok(BlendValue::Scalar(2.))
        );
    }

    #[test]
    fn free_blend_normalizes_through_feature() {
        let mut feature = base_feature();
        feature
            .add_animation(
                "Base",
                FreeBlendState::new(
                    "face",
                    [
                        clip("smile", 1.).with_weight(0.8),
                        clip("blink", 1.).with_weight(0.8),
                    ],
                ),
            )
            .unwrap();
        feature.play_animation("Base", "face", 0., Easing::Linear);
        feature.update_internal_weights();

        let children = feature
            .animation("Base", "face")
            .and_then(AnimationState::children)
            .unwrap();
        for child in children.iter() {
            assert!(approx(child.internal_weight(), 0.5));
        }
        assert!(approx(
            feature
                .animation_blend_weight("Base", "face", "smile")
                .unwrap(),
            0.8
        ));
        assert!(matches!(
            feature.set_animation_blend_value("Base", "face", Vec2::ONE, 0., Easing::Linear),
            Err(AnimationError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn queue_restarts_from_first_on_replay() {
        let mut feature = base_feature();
        feature
            .add_animation(
                "Base",
                QueueState::new(
                    "greeting",
                    [finite_clip("wave", 1., 1), finite_clip("bow", 1., 1)],
                    false,
                ),
            )
            .unwrap();

        let first = feature.play_animation("Base", "greeting", 0., Easing::Linear);
        feature.update(1000.);
        let second = feature.play_animation("Base", "greeting", 0., Easing::Linear);

        assert!(first.is_canceled());
        assert!(second.is_pending());
        let Some(AnimationState::Queue(queue)) = feature.animation("Base", "greeting") else {
            panic!("greeting is not a queue");
        };
        assert_eq!(queue.current_name(), Some("wave"));
        assert!(feature.play_next_animation("Base", "greeting").is_pending());
        assert!(feature.play_next_animation("Base", "idle").is_rejected());
    }

    #[test]
    fn finished_queue_restarts_from_first_on_replay() {
        let mut feature = base_feature();
        feature
            .add_animation(
                "Base",
                QueueState::new(
                    "greeting",
                    [finite_clip("wave", 1., 1), finite_clip("bow", 1., 1)],
                    false,
                ),
            )
            .unwrap();

        let first = feature.play_animation("Base", "greeting", 0., Easing::Linear);
        feature.update(1000.);
        feature.update(1000.);
        assert!(first.is_resolved());
        let Some(AnimationState::Queue(queue)) = feature.animation("Base", "greeting") else {
            panic!("greeting is not a queue");
        };
        assert!(queue.is_done());

        let second = feature.play_animation("Base", "greeting", 0., Easing::Linear);
        assert!(second.is_pending());
        let Some(AnimationState::Queue(queue)) = feature.animation("Base", "greeting") else {
            panic!("greeting is not a queue");
        };
        assert_eq!(queue.cursor(), 0);
        assert!(!queue.is_done());
        assert!(queue.states().get("wave").unwrap().is_playing());
        assert!(!queue.states().get("bow").unwrap().is_playing());
    }

    #[test]
    fn layers_keep_insertion_order_and_fall_back_on_bad_index() {
        let mut feature = base_feature();
        feature.add_layer("Top", LayerOptions::default(), None);
        feature.add_layer("Bottom", LayerOptions::default(), Some(0));
        feature.add_layer("Far", LayerOptions::default(), Some(42));
        assert_eq!(
            feature.layer_names().collect::<Vec<_>>(),
            ["Bottom", "Base", "Top", "Far"]
        );

        feature.move_layer("Far", 0).unwrap();
        feature.move_layer("Top", 99).unwrap();
        assert_eq!(
            feature.layer_names().collect::<Vec<_>>(),
            ["Far", "Bottom", "Base", "Top"]
        );
        assert_eq!(
            feature.move_layer("Nope", 0),
            Err(AnimationError::MissingLayer("Nope".into()))
        );
    }

    #[test]
    fn rename_and_remove_layers() {
        let mut feature = base_feature();
        feature.add_layer("Face", LayerOptions::default(), None);
        assert_eq!(feature.add_layer("Face", LayerOptions::default(), None), "Face1");

        assert_eq!(feature.rename_layer("Face1", "Base").unwrap(), "Base1");
        assert_eq!(
            feature.layer_names().collect::<Vec<_>>(),
            ["Base", "Face", "Base1"]
        );
        assert_eq!(feature.layer("Base1").map(AnimationLayer::name), Some("Base1"));

        let play = feature.play_animation("Base", "idle", 0., Easing::Linear);
        feature.remove_layer("Base").unwrap();
        assert!(play.is_canceled());
        assert!(feature.remove_layer("Base").is_err());
    }

    #[test]
    fn layer_weight_tweens() {
        let mut feature = base_feature();
        let fade = feature
            .set_layer_weight("Base", 0., 1., Easing::Linear)
            .unwrap();
        feature.update(500.);
        assert!(approx(feature.layer_weight("Base").unwrap(), 0.5));
        feature.update(500.);
        assert!(fade.is_resolved());
        assert!(feature.layer_weight("Missing").is_err());
    }

    #[test]
    fn observers_see_interrupts() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let recorded = events.clone();

        let mut feature = base_feature();
        feature.add_observer(move |event: &AnimationEvent| {
            recorded.borrow_mut().push(event.name())
        });

        feature.play_animation("Base", "idle", 0., Easing::Linear);
        feature.play_animation("Base", "walk", 0.5, Easing::Linear);
        feature.pause_animation("Base");
        feature.resume_animation("Base", None, 0., Easing::Linear);
        feature.stop_animation("Base");
        feature.play_animation("Base", "dance", 0., Easing::Linear);
        feature.rename_animation("Base", "walk", "stroll").unwrap();

        assert_eq!(
            *events.borrow(),
            [
                "play",
                "interrupt",
                "play",
                "pause",
                "resume",
                "stop",
                "renameAnimation"
            ]
        );
    }

    #[test]
    fn missing_layer_operations_fail() {
        let mut feature = base_feature();
        assert!(feature
            .play_animation("Nope", "idle", 0., Easing::Linear)
            .is_rejected());
        assert!(!feature.pause_animation("Nope"));
        assert!(!feature.stop_animation("Nope"));
        assert!(matches!(
            feature.add_animation("Nope", clip("x", 1.)),
            Err(AnimationError::MissingLayer(_))
        ));
    }

    #[test]
    fn pause_and_resume_whole_stack() {
        let mut feature = base_feature();
        let play = feature.play_animation("Base", "idle", 0., Easing::Linear);
        assert!(feature.pause());
        assert!(feature.layer("Base").unwrap().is_paused());

        let resumed = feature.resume();
        assert!(resumed.is_pending());
        assert!(play.is_pending());
        assert!(!feature.layer("Base").unwrap().is_paused());
    }

    #[test]
    fn replaying_one_layer_after_stack_resume_leaves_others_playing() {
        let mut feature = base_feature();
        feature.add_layer("Eyes", LayerOptions::default(), None);
        feature.add_animation("Eyes", clip("blink", 1.)).unwrap();
        let idle = feature.play_animation("Base", "idle", 0., Easing::Linear);
        let blink = feature.play_animation("Eyes", "blink", 0., Easing::Linear);

        feature.pause();
        let resumed = feature.resume();
        let replayed = feature.play_animation("Base", "idle", 0., Easing::Linear);

        assert!(idle.is_canceled());
        assert!(resumed.is_canceled());
        assert!(replayed.is_pending());
        assert!(blink.is_pending());
        assert!(feature.animation("Eyes", "blink").unwrap().is_playing());

        resumed.cancel();
        let resumed = feature.resume();
        resumed.cancel();
        assert!(blink.is_pending());
        assert!(replayed.is_pending());
    }
}
