//! Private secrets and the public qubits derived from them.
//!
//! Each [`PrivateSecret`] owns exactly one [`PublicQubit`] created with it.
//! Both carry the same id, which doubles as the physical qubit index the
//! measurement backend operates on. Secrets live in a [`SecretBatch`],
//! the issuer-side arena used to resolve a qubit back to its angles.

use std::fmt;

use rustc_hash::FxHashMap;
use tracing::{debug, info};

use qtoken_ir::{ClbitId, IrResult, Program, QubitId};

use crate::angle::{AngleSource, Degrees, PHI_RANGE, THETA_RANGE};
use crate::error::{TokenError, TokenResult};

/// Classical slot every single-qubit measurement writes into.
pub const RESULT_SLOT: ClbitId = ClbitId(0);

/// The holder-side rotatable unit.
///
/// Rotations accumulate in a pending program and are only ever appended;
/// measuring reads the program without changing it.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicQubit {
    id: QubitId,
    tag: Option<String>,
    program: Program,
}

impl PublicQubit {
    pub(crate) fn new(id: QubitId) -> Self {
        Self {
            id,
            tag: None,
            program: Program::new(),
        }
    }

    /// Id shared with the paired secret.
    pub fn id(&self) -> QubitId {
        self.id
    }

    /// Optional label.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Label this qubit. Independent of the secret's tag.
    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = Some(tag.into());
    }

    /// Rotations applied so far, not yet executed.
    pub fn pending_program(&self) -> &Program {
        &self.program
    }

    pub(crate) fn program_mut(&mut self) -> &mut Program {
        &mut self.program
    }

    /// The pending program followed by a measurement into [`RESULT_SLOT`].
    pub fn measurement_program(&self) -> IrResult<Program> {
        self.program.with_measurement(self.id, RESULT_SLOT)
    }
}

/// Issuer-held rotation angles for one qubit.
#[derive(Clone)]
pub struct PrivateSecret {
    id: QubitId,
    theta: Degrees,
    phi: Degrees,
    tag: Option<String>,
    public_qubit: PublicQubit,
}

impl PrivateSecret {
    /// Create a secret and its paired qubit.
    ///
    /// `id` must be positive, `theta` must lie in `[0, 180)` and `phi` in
    /// `[0, 360)`.
    pub fn new(id: QubitId, theta: Degrees, phi: Degrees) -> TokenResult<Self> {
        if id.0 == 0 {
            return Err(TokenError::InvalidArgument(
                "qubit ids start at 1".into(),
            ));
        }
        if !(0.0..THETA_RANGE).contains(&theta.0) {
            return Err(TokenError::InvalidArgument(format!(
                "theta {theta} is outside [0, {THETA_RANGE})"
            )));
        }
        if !(0.0..PHI_RANGE).contains(&phi.0) {
            return Err(TokenError::InvalidArgument(format!(
                "phi {phi} is outside [0, {PHI_RANGE})"
            )));
        }
        Ok(Self {
            id,
            theta,
            phi,
            tag: None,
            public_qubit: PublicQubit::new(id),
        })
    }

    /// Attach a label to the secret.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn id(&self) -> QubitId {
        self.id
    }

    pub fn theta(&self) -> Degrees {
        self.theta
    }

    pub fn phi(&self) -> Degrees {
        self.phi
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// The qubit created with this secret.
    pub fn public_qubit(&self) -> &PublicQubit {
        &self.public_qubit
    }
}

impl fmt::Debug for PrivateSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateSecret")
            .field("id", &self.id)
            .field("theta", &"[REDACTED]")
            .field("phi", &"[REDACTED]")
            .field("tag", &self.tag)
            .finish()
    }
}

/// A batch of secrets with pairwise-distinct ids, in generation order.
#[derive(Debug, Clone, Default)]
pub struct SecretBatch {
    secrets: Vec<PrivateSecret>,
    index: FxHashMap<QubitId, usize>,
}

impl SecretBatch {
    /// Build a batch from existing secrets, rejecting duplicate ids.
    pub fn from_secrets(secrets: impl IntoIterator<Item = PrivateSecret>) -> TokenResult<Self> {
        let mut batch = Self::default();
        for secret in secrets {
            batch.push(secret)?;
        }
        Ok(batch)
    }

    fn push(&mut self, secret: PrivateSecret) -> TokenResult<()> {
        if self.index.contains_key(&secret.id) {
            return Err(TokenError::DuplicateSecret(secret.id));
        }
        self.index.insert(secret.id, self.secrets.len());
        self.secrets.push(secret);
        Ok(())
    }

    /// Secret paired with `id`.
    pub fn get(&self, id: QubitId) -> Option<&PrivateSecret> {
        self.index.get(&id).map(|&i| &self.secrets[i])
    }

    /// Ids in generation order.
    pub fn ids(&self) -> impl Iterator<Item = QubitId> + '_ {
        self.secrets.iter().map(|s| s.id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PrivateSecret> {
        self.secrets.iter()
    }

    pub fn as_slice(&self) -> &[PrivateSecret] {
        &self.secrets
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

impl<'a> IntoIterator for &'a SecretBatch {
    type Item = &'a PrivateSecret;
    type IntoIter = std::slice::Iter<'a, PrivateSecret>;

    fn into_iter(self) -> Self::IntoIter {
        self.secrets.iter()
    }
}

/// Generate `n` secrets with ids `1..=n`, drawing angles from `source`.
pub fn generate_private_secrets<S>(n: u32, source: &mut S) -> TokenResult<SecretBatch>
where
    S: AngleSource + ?Sized,
{
    if n == 0 {
        return Err(TokenError::InvalidArgument(
            "at least one secret must be generated".into(),
        ));
    }

    let mut batch = SecretBatch::default();
    for id in 1..=n {
        let theta = source.next_theta();
        let phi = source.next_phi();
        batch.push(PrivateSecret::new(QubitId(id), theta, phi)?)?;
        debug!(qubit = id, "generated private secret");
    }

    info!(count = n, "generated private secrets");
    Ok(batch)
}

/// The public qubit of every secret, in batch order.
///
/// Returns the paired instances themselves, so repeated calls yield the
/// same qubits.
pub fn make_public_qubits_array(secrets: &SecretBatch) -> Vec<&PublicQubit> {
    secrets.iter().map(PrivateSecret::public_qubit).collect()
}

/// Look up the secret paired with qubit `id`.
pub fn find_private_secret(secrets: &SecretBatch, id: QubitId) -> Option<&PrivateSecret> {
    secrets.get(id)
}
