use std::time::{
    Duration,
    Instant,
};

/// How long success toasts and error banners stay on screen.
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ToastId(u64);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ToastKind {
    Pending,
    Success,
    Error,
}

#[derive(Clone, Debug)]
pub struct Toast {
    pub id: ToastId,
    pub kind: ToastKind,
    pub text: String,
    expires_at: Option<Instant>,
}

impl Toast {
    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }
}

/// Inline error line shown above the wave list.
#[derive(Clone, Debug)]
pub struct Banner {
    pub text: String,
    expires_at: Instant,
}

#[derive(Debug, Default)]
pub struct Notifications {
    toasts: Vec<Toast>,
    banner: Option<Banner>,
    next_id: u64,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows a toast. `ttl` of `None` keeps it until it is updated or
    /// dismissed.
    pub fn show(
        &mut self,
        kind: ToastKind,
        text: impl Into<String>,
        ttl: Option<Duration>,
        now: Instant,
    ) -> ToastId {
        let id = ToastId(self.next_id);
        self.next_id += 1;
        self.toasts.push(Toast {
            id,
            kind,
            text: text.into(),
            expires_at: ttl.map(|ttl| now + ttl),
        });
        id
    }

    /// Rewrites an existing toast in place. Returns false if it is already
    /// gone.
    pub fn update(
        &mut self,
        id: ToastId,
        kind: ToastKind,
        text: impl Into<String>,
        ttl: Option<Duration>,
        now: Instant,
    ) -> bool {
        let Some(toast) = self.toasts.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        toast.kind = kind;
        toast.text = text.into();
        toast.expires_at = ttl.map(|ttl| now + ttl);
        true
    }

    pub fn dismiss(&mut self, id: ToastId) {
        self.toasts.retain(|t| t.id != id);
    }

    /// Sets the inline banner and raises a matching error toast, both gone
    /// after [`NOTICE_TTL`].
    pub fn flash_error(&mut self, text: impl Into<String>, now: Instant) {
        let text = text.into();
        self.show(ToastKind::Error, text.clone(), Some(NOTICE_TTL), now);
        self.banner = Some(Banner {
            text,
            expires_at: now + NOTICE_TTL,
        });
    }

    /// Drops everything whose deadline is at or before `now`. Returns true
    /// when something was removed.
    pub fn expire(&mut self, now: Instant) -> bool {
        let before = self.toasts.len();
        self.toasts
            .retain(|t| t.expires_at.is_none_or(|deadline| deadline > now));
        let mut changed = self.toasts.len() != before;
        if self.banner.as_ref().is_some_and(|b| b.expires_at <= now) {
            self.banner = None;
            changed = true;
        }
        changed
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn get(&self, id: ToastId) -> Option<&Toast> {
        self.toasts.iter().find(|t| t.id == id)
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    #[test]
    fn expire__sticky_toast__survives() {
        // given
        let now = Instant::now();
        let mut notes = Notifications::new();
        let id = notes.show(ToastKind::Pending, "mining", None, now);

        // when
        notes.expire(now + Duration::from_secs(3600));

        // then
        assert!(notes.get(id).is_some());
    }

    #[test]
    fn expire__removes_toast_exactly_at_deadline() {
        // given
        let now = Instant::now();
        let mut notes = Notifications::new();
        let id = notes.show(ToastKind::Success, "ok", Some(NOTICE_TTL), now);

        // when
        let early = notes.expire(now + NOTICE_TTL - Duration::from_millis(1));
        let on_time = notes.expire(now + NOTICE_TTL);

        // then
        assert!(!early);
        assert!(on_time);
        assert!(notes.get(id).is_none());
    }

    #[test]
    fn update__turns_sticky_toast_into_timed_one() {
        // given
        let now = Instant::now();
        let mut notes = Notifications::new();
        let id = notes.show(ToastKind::Pending, "mining", None, now);

        // when
        let later = now + Duration::from_secs(10);
        assert!(notes.update(id, ToastKind::Success, "Success", Some(NOTICE_TTL), later));

        // then
        let toast = notes.get(id).unwrap();
        assert_eq!(toast.kind, ToastKind::Success);
        assert_eq!(toast.expires_at(), Some(later + NOTICE_TTL));
    }

    #[test]
    fn update__dismissed_toast__returns_false() {
        let now = Instant::now();
        let mut notes = Notifications::new();
        let id = notes.show(ToastKind::Pending, "mining", None, now);
        notes.dismiss(id);
        assert!(!notes.update(id, ToastKind::Success, "Success", None, now));
    }

    #[test]
    fn flash_error__banner_clears_after_three_seconds() {
        // given
        let now = Instant::now();
        let mut notes = Notifications::new();

        // when
        notes.flash_error("Connect your wallet!", now);

        // then
        assert_eq!(notes.banner().map(|b| b.text.as_str()), Some("Connect your wallet!"));
        assert_eq!(notes.toasts().len(), 1);
        notes.expire(now + Duration::from_secs(3));
        assert!(notes.banner().is_none());
        assert!(notes.toasts().is_empty());
    }
}
