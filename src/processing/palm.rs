//! Palm rejection.
//!
//! A contact is kept as a fingertip or thumb when its shape statistics fall
//! inside empirically tuned bounds, and is marked as a palm otherwise. Palms
//! contaminate their spatial neighborhood, so that the fingers of a resting
//! hand do not survive as ghost touches.
//!
//! The constants are deliberately not configurable at runtime.

use super::contact::Contact;

const FINGER_EV1: f64 = 0.6;
const FINGER_WIDE_EV1: f64 = 1.0;
const FINGER_WIDE_MAX_V: f64 = 80.0;

const THUMB_EV1: f64 = 1.25;
const THUMB_WIDE_EV1: f64 = 3.5;
const THUMB_WIDE_MAX_V: f64 = 90.0;
const THUMB_ASPECT: f64 = 1.8;

fn is_finger(contact: &Contact) -> bool {
    contact.ev1 < FINGER_EV1
        || (contact.ev1 < FINGER_WIDE_EV1 && contact.max_v > FINGER_WIDE_MAX_V)
}

fn is_thumb(contact: &Contact) -> bool {
    let size_ok = contact.ev1 < THUMB_EV1
        || (contact.ev1 < THUMB_WIDE_EV1 && contact.max_v > THUMB_WIDE_MAX_V);

    size_ok && contact.ev1 / contact.ev2 > THUMB_ASPECT
}

/// Classify every contact, propagating palm status to neighbors.
///
/// Contagion is a single forward pass: once a contact is ruled a palm,
/// every not-yet-palm contact inside its influence ellipse is marked too.
pub fn classify(contacts: &mut [Contact]) {
    for i in 0..contacts.len() {
        if is_finger(&contacts[i]) || is_thumb(&contacts[i]) {
            continue;
        }

        contacts[i].is_palm = true;

        let palm = contacts[i];
        for other in contacts.iter_mut() {
            if other.is_palm {
                continue;
            }

            if other.near(&palm) {
                other.is_palm = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(ev1: f64, ev2: f64, max_v: f64) -> Contact {
        Contact {
            ev1,
            ev2,
            max_v,
            qx1: 1.0,
            qy1: 0.0,
            qx2: 0.0,
            qy2: 1.0,
            ..Contact::default()
        }
    }

    #[test]
    fn small_contact_is_a_finger() {
        let mut contacts = [contact(0.5, 0.4, 30.0)];
        classify(&mut contacts);
        assert!(!contacts[0].is_palm);
    }

    #[test]
    fn strong_wide_contact_is_a_finger() {
        let mut contacts = [contact(0.9, 0.5, 100.0)];
        classify(&mut contacts);
        assert!(!contacts[0].is_palm);
    }

    #[test]
    fn elongated_contact_is_a_thumb() {
        let mut contacts = [contact(1.2, 0.5, 60.0)];
        classify(&mut contacts);
        assert!(!contacts[0].is_palm);
    }

    #[test]
    fn round_large_contact_is_a_palm() {
        // Too large for the finger rules, too round for the thumb rule.
        let mut contacts = [contact(2.0, 1.5, 120.0)];
        classify(&mut contacts);
        assert!(contacts[0].is_palm);
    }

    #[test]
    fn weak_medium_contact_is_a_palm() {
        let mut contacts = [contact(0.8, 0.7, 50.0)];
        classify(&mut contacts);
        assert!(contacts[0].is_palm);
    }

    #[test]
    fn palm_contaminates_nearby_finger() {
        let mut palm = contact(4.0, 3.9, 120.0);
        palm.x = 10.0;
        palm.y = 10.0;

        let mut finger = contact(0.4, 0.3, 40.0);
        finger.x = 14.0;
        finger.y = 10.0;

        let mut distant = contact(0.4, 0.3, 40.0);
        distant.x = 60.0;
        distant.y = 60.0;

        let mut contacts = [palm, finger, distant];
        classify(&mut contacts);

        assert!(contacts[0].is_palm);
        assert!(contacts[1].is_palm, "finger next to the palm must be blocked");
        assert!(!contacts[2].is_palm, "distant finger stays valid");
    }
}
