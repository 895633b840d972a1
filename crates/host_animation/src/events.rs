use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerPayload {
    pub name: String,
    pub index: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenamePayload {
    pub old_name: String,
    pub new_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationPayload {
    pub layer_name: String,
    pub animation_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationRenamePayload {
    pub layer_name: String,
    pub old_name: String,
    pub new_name: String,
}

/// Notifications emitted by an [`AnimationFeature`](crate::feature::AnimationFeature) when its
/// layer stack or playback changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum AnimationEvent {
    AddLayer(LayerPayload),
    RemoveLayer(LayerPayload),
    RenameLayer(RenamePayload),
    AddAnimation(AnimationPayload),
    RemoveAnimation(AnimationPayload),
    RenameAnimation(AnimationRenamePayload),
    Play(AnimationPayload),
    Pause(AnimationPayload),
    Resume(AnimationPayload),
    /// A pending animation was pre-empted by another one on the same layer.
    Interrupt(AnimationPayload),
    Stop(AnimationPayload),
}

impl AnimationEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AnimationEvent::AddLayer(_) => "addLayer",
            AnimationEvent::RemoveLayer(_) => "removeLayer",
            AnimationEvent::RenameLayer(_) => "renameLayer",
            AnimationEvent::AddAnimation(_) => "addAnimation",
            AnimationEvent::RemoveAnimation(_) => "removeAnimation",
            AnimationEvent::RenameAnimation(_) => "renameAnimation",
            AnimationEvent::Play(_) => "play",
            AnimationEvent::Pause(_) => "pause",
            AnimationEvent::Resume(_) => "resume",
            AnimationEvent::Interrupt(_) => "interrupt",
            AnimationEvent::Stop(_) => "stop",
        }
    }

    pub(crate) fn animation(
        layer_name: &str,
        animation_name: &str,
        build: fn(AnimationPayload) -> Self,
    ) -> Self {
        build(AnimationPayload {
            layer_name: layer_name.to_string(),
            animation_name: animation_name.to_string(),
        })
    }
}

/// Receives every [`AnimationEvent`] a feature emits.
pub trait LayerObserver {
    fn on_animation_event(&mut self, event: &AnimationEvent);
}

impl<F> LayerObserver for F
where
    F: FnMut(&AnimationEvent),
{
    fn on_animation_event(&mut self, event: &AnimationEvent) {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_are_camel_case() {
        let event = AnimationEvent::animation("Base", "walk", AnimationEvent::Interrupt);
        assert_eq!(event.name(), "interrupt");
        assert_eq!(
            AnimationEvent::RenameLayer(RenamePayload {
                old_name: "a".into(),
                new_name: "b".into(),
            })
            .name(),
            "renameLayer"
        );
    }

    #[test]
    fn payload_fields_serialize_in_camel_case() {
        let event = AnimationEvent::animation("Base", "walk", AnimationEvent::Play);
        let serialized = ron::to_string(&event).unwrap();
        assert!(serialized.contains("layerName"));
        assert!(serialized.contains("animationName"));
    }
}
