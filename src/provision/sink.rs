use super::events::ProvisionEvent;

/// Observer for provisioning progress.
pub trait EventSink: Send {
    fn emit(&mut self, event: ProvisionEvent);
}
