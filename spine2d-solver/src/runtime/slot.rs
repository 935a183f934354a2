use crate::SlotData;

#[derive(Clone, Debug)]
pub struct Slot {
    data_index: usize,
    pub bone: usize,
    /// Name of the current attachment.
    pub attachment: Option<String>,
    /// Skin the current attachment was resolved from.
    pub(crate) attachment_skin: Option<String>,
    pub color: [f32; 4],
    /// Vertex deformation, `[x0, y0, x1, y1, ..]`. For unweighted vertices it replaces the
    /// local positions, one pair per vertex. For weighted vertices it is added to each bone
    /// weight's position, one pair per weight. Ignored when the length does not match.
    pub deform: Vec<f32>,
}

impl Slot {
    pub(crate) fn new(data_index: usize, data: &SlotData) -> Self {
        Self {
            data_index,
            bone: data.bone,
            attachment: None,
            attachment_skin: None,
            color: data.color,
            deform: Vec::new(),
        }
    }

    pub fn data_index(&self) -> usize {
        self.data_index
    }

    pub fn attachment_skin(&self) -> Option<&str> {
        self.attachment_skin.as_deref()
    }

    pub(crate) fn set_attachment(&mut self, attachment: Option<(String, String)>) {
        let (name, skin) = match attachment {
            Some((name, skin)) => (Some(name), Some(skin)),
            None => (None, None),
        };
        if self.attachment != name || self.attachment_skin != skin {
            self.deform.clear();
        }
        self.attachment = name;
        self.attachment_skin = skin;
    }
}
