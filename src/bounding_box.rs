use serde::{Deserialize, Serialize};

/// One detection returned by the hosted model. Boxes are center-based, in
/// pixel units of the submitted image. The `class` wire key is kept on
/// serialization so stored predictions match the model's raw output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(rename = "class")]
    pub class_label: String,
    #[serde(default)]
    pub confidence: f32,
}

/// Corner form used for drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxCorners {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Prediction {
    pub fn corners(&self) -> BoxCorners {
        BoxCorners {
            x1: self.x - self.width / 2.0,
            y1: self.y - self.height / 2.0,
            x2: self.x + self.width / 2.0,
            y2: self.y + self.height / 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_from_center_form() {
        let pred = Prediction {
            x: 100.0,
            y: 100.0,
            width: 50.0,
            height: 80.0,
            class_label: "sleeve".to_string(),
            confidence: 0.9,
        };

        let corners = pred.corners();

        assert_eq!((corners.x1, corners.y1), (75.0, 60.0));
        assert_eq!((corners.x2, corners.y2), (125.0, 140.0));
    }

    #[test]
    fn deserializes_model_wire_format() {
        let raw = r#"{
            "x": 10.5,
            "y": 20.0,
            "width": 4.0,
            "height": 6.0,
            "confidence": 0.87,
            "class": "neckline",
            "class_id": 1,
            "detection_id": "5e35e92b"
        }"#;

        let pred: Prediction = serde_json::from_str(raw).unwrap();

        assert_eq!(pred.class_label, "neckline");
        assert_eq!(pred.width, 4.0);
        assert_eq!(pred.confidence, 0.87);
    }

    #[test]
    fn serializes_class_key_for_storage() {
        let pred = Prediction {
            x: 1.0,
            y: 2.0,
            width: 3.0,
            height: 4.0,
            class_label: "sleeve".to_string(),
            confidence: 0.5,
        };

        let value = serde_json::to_value(&pred).unwrap();

        assert_eq!(value["class"], "sleeve");
        assert!(value.get("class_label").is_none());
    }
}
