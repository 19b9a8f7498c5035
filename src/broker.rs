// =============================================================================
// broker.rs - Contrat du fournisseur de captures
// broker.rs - Capture broker contract
// =============================================================================

use async_trait::async_trait;

use crate::error::CaptureError;

/// Composant privilégié capable de rasteriser la zone visible
/// Privileged component able to rasterize the visible area
///
/// La requête ne porte aucune donnée; la réponse est une image encodée de tout
/// le viewport (data URI). Aucun délai maximal n'est imposé à l'aller-retour.
/// The request carries no payload; the response is an encoded image of the
/// whole viewport (data URI). No timeout governs the round trip.
#[async_trait]
pub trait CaptureBroker: Send + Sync {
    async fn capture(&self) -> Result<String, CaptureError>;
}

/// Broker servant toujours la même image (CLI, démonstrations)
/// Broker that always serves the same image (CLI, demos)
#[derive(Clone, Debug)]
pub struct StaticBroker {
    data_uri: String,
}

impl StaticBroker {
    pub fn new(data_uri: impl Into<String>) -> Self {
        Self {
            data_uri: data_uri.into(),
        }
    }
}

#[async_trait]
impl CaptureBroker for StaticBroker {
    async fn capture(&self) -> Result<String, CaptureError> {
        Ok(self.data_uri.clone())
    }
}
