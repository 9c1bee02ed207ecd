//! The record layer state machine.
//!
//! One [`RecordLayer`] serves one direction of one epoch: it pulls
//! datagrams from its transport, peels authenticated records out of them,
//! and emits records the other way. Everything untrusted is discarded
//! silently; only post-authentication failures and protocol-mandated
//! conditions surface as fatal errors with an alert attached.

use crate::alert::Alert;
use crate::buffer::{Buf, BufferPool};
use crate::crypto::{Compression, DecryptOutcome, RecordCipher, RecordMac, RecordMeta};
use crate::message::{ContentType, ProtocolVersion, RecordHeader};
use crate::message::{
    MAX_COMPRESSED_LENGTH, MAX_ENCRYPTED_LENGTH, MAX_ENCRYPTED_OVERHEAD, MAX_PLAIN_LENGTH,
};
use crate::queue::{DeferredQueue, Insert};
use crate::seq::{sequence_update, Sequence};
use crate::transport::{ReadOutcome, Transport, WriteOutcome};
use crate::window::{Freshness, ReplayWindow};
use crate::Error;

/// Endpoint role the layer was created for.
///
/// The DTLS 1.2 record transforms are role-agnostic; the role is carried
/// for the caller and for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The connecting side.
    Client,
    /// The accepting side.
    Server,
}

/// Primary direction this layer was created to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Decrypting incoming datagrams.
    Read,
    /// Protecting outgoing records.
    Write,
}

/// Result of asking the layer to stage the next record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetch {
    /// One record is staged; fetch it with [`RecordLayer::read_record`].
    Record,
    /// The transport has nothing deliverable right now. All pipeline
    /// state is preserved; call again once the transport is ready.
    Retry,
    /// The transport is closed.
    Eof,
}

/// Result of submitting a record for transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flush {
    /// The record was handed to the transport; this many payload bytes
    /// were consumed.
    Written(usize),
    /// The transport would block. Retry with an identical template.
    Retry,
}

/// Caller's request to emit one record.
#[derive(Debug, Clone, Copy)]
pub struct WriteTemplate<'a> {
    /// Record content type.
    pub content_type: ContentType,
    /// Protocol version to stamp into the header.
    pub version: ProtocolVersion,
    /// Plaintext payload.
    pub payload: &'a [u8],
}

/// One delivered record.
#[derive(Debug)]
pub struct RecordView<'a> {
    /// Record content type.
    pub content_type: ContentType,
    /// Protocol version from the record header.
    pub version: ProtocolVersion,
    /// Epoch and sequence number the record arrived under.
    pub sequence: Sequence,
    /// Decrypted, decompressed payload.
    pub payload: &'a [u8],
}

/// Observer invoked with the 13 header bytes of each record read (`sent
/// == false`) or written (`sent == true`).
pub type MsgCallback = Box<dyn FnMut(bool, &[u8])>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    Header,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowId {
    Current,
    Next,
}

enum Read {
    Exact,
    Short,
    Retry,
    Eof,
}

/// A decrypted record staged for the caller.
struct PlainRecord {
    content_type: ContentType,
    version: ProtocolVersion,
    sequence: Sequence,
    payload: Buf,
}

/// An encrypted record buffered for a later epoch, raw wire bytes.
struct DeferredRecord {
    packet: Buf,
}

struct PendingWrite {
    content_type: ContentType,
    payload: Buf,
    wire: Buf,
    total: usize,
}

/// One direction of the DTLS record protocol at one epoch.
///
/// Create with [`RecordLayer::builder`]. Drive reads with
/// [`get_more_records`](RecordLayer::get_more_records) /
/// [`read_record`](RecordLayer::read_record) /
/// [`release_record`](RecordLayer::release_record), writes with
/// [`write_records`](RecordLayer::write_records), and hand leftovers to a
/// successor with [`close`](RecordLayer::close) when keys change.
pub struct RecordLayer {
    version: ProtocolVersion,
    role: Role,
    direction: Direction,
    epoch: u16,
    in_init: bool,
    is_first_record: bool,
    max_frag_len: usize,

    cipher: Option<Box<dyn RecordCipher>>,
    mac: Option<Box<dyn RecordMac>>,
    compression: Option<Box<dyn Compression>>,
    use_etm: bool,

    transport: Box<dyn Transport>,
    prev: Option<Box<dyn Transport>>,
    next: Option<Box<dyn Transport>>,
    msg_callback: Option<MsgCallback>,

    pool: BufferPool,
    /// Unconsumed bytes of the current datagram.
    rbuf: Buf,
    roff: usize,
    /// Raw bytes of the record currently being read (header + body).
    packet: Buf,
    rstate: ReadState,

    replay: ReplayWindow,
    next_replay: ReplayWindow,
    /// Encrypted next-epoch records awaiting keys.
    unprocessed: DeferredQueue<DeferredRecord>,
    /// Decrypted records withheld from delivery (renegotiation).
    processed: DeferredQueue<PlainRecord>,

    current: Option<PlainRecord>,

    write_sequence: [u8; 8],
    wpend: Option<PendingWrite>,

    alert: Option<Alert>,
}

impl RecordLayer {
    /// Start building a record layer over the given transport.
    pub fn builder(transport: Box<dyn Transport>) -> RecordLayerBuilder {
        RecordLayerBuilder {
            transport,
            version: ProtocolVersion::Dtls1_2,
            role: Role::Server,
            direction: Direction::Read,
            epoch: 0,
            cipher: None,
            mac: None,
            use_etm: false,
            compression: None,
            prev: None,
            next: None,
            max_frag_len: MAX_PLAIN_LENGTH,
            first_record: None,
            msg_callback: None,
        }
    }

    // ------------------------------------------------------------------
    // Read path
    // ------------------------------------------------------------------

    /// Pull datagrams until one record is staged for the caller.
    ///
    /// Returns [`Fetch::Record`] with a record available via
    /// [`read_record`](Self::read_record), [`Fetch::Retry`] when the
    /// transport would block, or [`Fetch::Eof`]. Malformed, replayed,
    /// undecryptable and otherwise untrusted input is dropped without a
    /// trace other than a log line; see [`Error`] for the conditions that
    /// do surface.
    pub fn get_more_records(&mut self) -> Result<Fetch, Error> {
        if self.current.is_some() {
            return Ok(Fetch::Record);
        }

        loop {
            // Records parked during renegotiation are served before
            // touching the wire.
            if let Some((_, record)) = self.processed.pop_min() {
                self.current = Some(record);
                return Ok(Fetch::Record);
            }

            debug_assert_eq!(self.rstate, ReadState::Header);
            self.packet.clear();

            match self.read_n(RecordHeader::LEN, true)? {
                Read::Exact => {}
                Read::Short => {
                    trace!("partial record header, dropping datagram remainder");
                    continue;
                }
                Read::Retry => return Ok(Fetch::Retry),
                Read::Eof => return Ok(Fetch::Eof),
            }

            if let Some(callback) = &mut self.msg_callback {
                callback(false, &self.packet[..RecordHeader::LEN]);
            }

            let header = match RecordHeader::parse(&self.packet) {
                Ok((_, header)) => header,
                Err(_) => {
                    self.packet.clear();
                    continue;
                }
            };

            // Version tolerance: alerts may carry a mismatched version
            // (the peer may be failing version negotiation itself).
            if !self.is_first_record
                && header.content_type != ContentType::Alert
                && header.version != self.version
            {
                trace!("version mismatch {:?}, dropping record", header.version);
                self.packet.clear();
                continue;
            }

            if header.version.major() != self.version.major() {
                trace!("wrong major version, dropping record");
                self.packet.clear();
                continue;
            }

            let body_len = header.length as usize;

            if body_len > MAX_ENCRYPTED_LENGTH {
                trace!("record too long ({}), dropping", body_len);
                self.packet.clear();
                continue;
            }

            if body_len > self.max_frag_len + MAX_ENCRYPTED_OVERHEAD {
                trace!("record exceeds fragment limit ({}), dropping", body_len);
                self.packet.clear();
                continue;
            }

            self.rstate = ReadState::Body;

            if body_len > 0 {
                match self.read_n(body_len, false)? {
                    Read::Exact => {}
                    _ => {
                        // The datagram ended mid-record.
                        trace!("truncated record body, dropping");
                        self.rstate = ReadState::Header;
                        self.packet.clear();
                        continue;
                    }
                }
            }

            self.rstate = ReadState::Header;

            // Match epochs. No route means the record is dropped on the
            // floor.
            let Some((which, is_next_epoch)) = self.route(&header) else {
                trace!(
                    "no route for epoch {} (current {}), dropping",
                    header.sequence.epoch,
                    self.epoch
                );
                self.packet.clear();
                continue;
            };

            if !self.transport.reliable_ordered() {
                let seq = header.sequence.as_u64();
                if self.window(which).check(seq) != Freshness::Fresh {
                    trace!("replayed or stale sequence {:?}, dropping", header.sequence);
                    self.packet.clear();
                    continue;
                }
            }

            if body_len == 0 {
                // Legal but uninteresting.
                self.packet.clear();
                continue;
            }

            if is_next_epoch {
                // Cannot be processed until the next keys are installed.
                if self.in_init {
                    self.buffer_unprocessed(&header);
                }
                self.packet.clear();
                continue;
            }

            match self.process_record(&header)? {
                Some(record) => {
                    // Only now has the record proven itself; acknowledge
                    // receipt so replays of it are rejected.
                    self.window_mut(which).update(header.sequence.as_u64());
                    self.packet.clear();
                    self.is_first_record = false;
                    self.current = Some(record);
                    return Ok(Fetch::Record);
                }
                None => {
                    self.packet.clear();
                    continue;
                }
            }
        }
    }

    /// The currently staged record, if any.
    pub fn read_record(&self) -> Option<RecordView<'_>> {
        self.current.as_ref().map(|record| RecordView {
            content_type: record.content_type,
            version: record.version,
            sequence: record.sequence,
            payload: &record.payload,
        })
    }

    /// Release the staged record, recycling its buffer.
    pub fn release_record(&mut self) {
        if let Some(record) = self.current.take() {
            self.pool.push(record.payload);
        }
    }

    /// Park the staged record for later delivery.
    ///
    /// Used during renegotiation when a decrypted record cannot be
    /// consumed yet; it will be served again by a later
    /// [`get_more_records`](Self::get_more_records) call, ahead of any
    /// wire input.
    pub fn defer_processed_record(&mut self) {
        if let Some(record) = self.current.take() {
            let priority = record.sequence.as_u64();
            if self.processed.insert(priority, record) != Insert::Queued {
                debug!("processed queue rejected record, dropping");
            }
        }
    }

    /// Fill `self.packet` with exactly `want` more bytes of the current
    /// datagram. `allow_refill` permits pulling a fresh datagram and is
    /// only set when starting a new record: a record never spans
    /// datagrams, so a body read that runs dry is a truncation, not a
    /// reason to wait for more.
    fn read_n(&mut self, want: usize, allow_refill: bool) -> Result<Read, Error> {
        if self.roff >= self.rbuf.len() {
            if !allow_refill {
                return Ok(Read::Short);
            }

            self.rbuf.clear();
            self.roff = 0;

            // Leftovers migrated from the predecessor layer are served
            // before the wire.
            if let Some(prev) = &mut self.prev {
                match prev.recv(&mut self.rbuf)? {
                    ReadOutcome::Datagram(_) => {}
                    ReadOutcome::WouldBlock | ReadOutcome::Eof => {
                        self.prev = None;
                    }
                }
            }

            if self.rbuf.is_empty() {
                match self.transport.recv(&mut self.rbuf)? {
                    ReadOutcome::Datagram(_) => {}
                    ReadOutcome::WouldBlock => return Ok(Read::Retry),
                    ReadOutcome::Eof => return Ok(Read::Eof),
                }
            }

            if self.rbuf.is_empty() {
                // A zero-length datagram.
                return Ok(Read::Short);
            }
        }

        let available = self.rbuf.len() - self.roff;
        let take = available.min(want);
        self.packet.extend_from_slice(&self.rbuf[self.roff..self.roff + take]);
        self.roff += take;

        Ok(if take == want { Read::Exact } else { Read::Short })
    }

    /// Select the replay window applicable to this record's epoch, or
    /// none if the record must be dropped.
    fn route(&self, header: &RecordHeader) -> Option<(WindowId, bool)> {
        let epoch = header.sequence.epoch;

        if epoch == self.epoch {
            return Some((WindowId::Current, false));
        }

        // Only handshake and alert records can arrive from the next
        // epoch, and only while no backlog for the current epoch remains
        // in the unprocessed queue.
        if epoch == self.epoch.wrapping_add(1)
            && self.unprocessed.epoch() != self.epoch
            && matches!(
                header.content_type,
                ContentType::Handshake | ContentType::Alert
            )
        {
            return Some((WindowId::Next, true));
        }

        None
    }

    fn window(&self, which: WindowId) -> &ReplayWindow {
        match which {
            WindowId::Current => &self.replay,
            WindowId::Next => &self.next_replay,
        }
    }

    fn window_mut(&mut self, which: WindowId) -> &mut ReplayWindow {
        match which {
            WindowId::Current => &mut self.replay,
            WindowId::Next => &mut self.next_replay,
        }
    }

    /// Stash the raw packet bytes of a next-epoch record until its keys
    /// arrive. Queue overflow and duplicates quietly discard the record;
    /// the peer will retransmit.
    fn buffer_unprocessed(&mut self, header: &RecordHeader) {
        let priority = header.sequence.as_u64();

        let mut packet = self.pool.pop();
        packet.extend_from_slice(&self.packet);

        match self.unprocessed.insert(priority, DeferredRecord { packet }) {
            Insert::Queued => {
                debug!("buffered next-epoch record {:?}", header.sequence);
            }
            Insert::Full => {
                debug!("unprocessed queue full, dropping next-epoch record");
            }
            Insert::Duplicate => {
                trace!("duplicate next-epoch record {:?}, dropping", header.sequence);
            }
        }
    }

    /// Decrypt, authenticate and decompress the record in `self.packet`.
    ///
    /// Returns `Ok(None)` for the silent-drop outcomes and `Err` for the
    /// conditions the protocol escalates.
    fn process_record(&mut self, header: &RecordHeader) -> Result<Option<PlainRecord>, Error> {
        let meta = RecordMeta {
            content_type: header.content_type,
            version: header.version,
            sequence: header.sequence,
        };

        let mut data = self.pool.pop();
        data.extend_from_slice(&self.packet[RecordHeader::LEN..]);

        let mac_len = self.mac.as_ref().map(|mac| mac.mac_len()).unwrap_or(0);
        let mut mac_inside_ciphertext = mac_len;

        // Encrypt-then-MAC: authenticate the ciphertext before spending
        // any decryption work. A failure here is not silent; the packet
        // was well-formed enough that a mismatch indicates tampering.
        if self.use_etm {
            if let Some(mac) = &mut self.mac {
                if data.len() < mac_len {
                    self.pool.push(data);
                    return Err(self.fatal(Error::LengthTooShort));
                }

                let split = data.len() - mac_len;
                let expected = mac.compute(&meta, &data[..split]);

                if !constant_time_eq(&expected, &data[split..]) {
                    self.pool.push(data);
                    return Err(self.fatal(Error::BadRecordMac));
                }

                data.truncate(split);
                mac_inside_ciphertext = 0;
            }
        }

        if let Some(cipher) = &mut self.cipher {
            match cipher.decrypt(&meta, &mut data, mac_inside_ciphertext) {
                DecryptOutcome::Ok => {}
                DecryptOutcome::Silent => {
                    // For DTLS we simply ignore bad packets.
                    trace!("undecryptable record {:?}, dropping", header.sequence);
                    self.pool.push(data);
                    return Ok(None);
                }
                DecryptOutcome::Fatal(alert) => {
                    self.pool.push(data);
                    return Err(self.fatal(Error::CipherFatal(alert)));
                }
            }
        }

        // MAC-then-encrypt: the plaintext carries its MAC trailer. All
        // failures here predate any proof of origin, so they stay silent.
        if !self.use_etm && self.cipher.is_some() {
            if let Some(mac) = &mut self.mac {
                if data.len() < mac_len || data.len() > MAX_COMPRESSED_LENGTH + mac_len {
                    self.pool.push(data);
                    return Ok(None);
                }

                let split = data.len() - mac_len;
                let expected = mac.compute(&meta, &data[..split]);

                if !constant_time_eq(&expected, &data[split..]) {
                    trace!("bad record mac {:?}, dropping", header.sequence);
                    self.pool.push(data);
                    return Ok(None);
                }

                data.truncate(split);
            }
        }

        if let Some(compression) = &mut self.compression {
            if data.len() > MAX_COMPRESSED_LENGTH {
                self.pool.push(data);
                return Err(self.fatal(Error::CompressedLengthTooLong));
            }

            let mut inflated = self.pool.pop();
            if compression
                .decompress(&data, &mut inflated, MAX_PLAIN_LENGTH)
                .is_err()
            {
                self.pool.push(data);
                self.pool.push(inflated);
                return Err(self.fatal(Error::BadDecompression));
            }

            self.pool.push(std::mem::replace(&mut data, inflated));
        }

        if data.len() > self.max_frag_len {
            self.pool.push(data);
            return Err(self.fatal(Error::DataLengthTooLong));
        }

        Ok(Some(PlainRecord {
            content_type: header.content_type,
            version: header.version,
            sequence: header.sequence,
            payload: data,
        }))
    }

    // ------------------------------------------------------------------
    // Write path
    // ------------------------------------------------------------------

    /// Protect and transmit one record.
    ///
    /// DTLS emits one record per datagram, so exactly one template is
    /// accepted. A [`Flush::Retry`] return keeps the protected record
    /// pending; call again with an identical template once the transport
    /// is ready. A retry with a different template is a fatal
    /// [`Error::BadWriteRetry`].
    pub fn write_records(&mut self, templates: &[WriteTemplate<'_>]) -> Result<Flush, Error> {
        if templates.len() != 1 {
            return Err(self.fatal(Error::BadTemplateCount(templates.len())));
        }
        let template = &templates[0];

        if let Some(pending) = &self.wpend {
            if pending.content_type != template.content_type
                || pending.total != template.payload.len()
                || &*pending.payload != template.payload
            {
                return Err(self.fatal(Error::BadWriteRetry));
            }
            return self.flush_pending();
        }

        if template.payload.len() > self.max_frag_len {
            return Err(self.fatal(Error::DataLengthTooLong));
        }

        let meta = RecordMeta {
            content_type: template.content_type,
            version: template.version,
            sequence: self.next_write_sequence(),
        };

        let explicit_iv_len = self
            .cipher
            .as_ref()
            .map(|cipher| cipher.mode().explicit_iv_len())
            .unwrap_or(0);

        // Assemble the fragment: reserved explicit IV, then the
        // compressed (or copied) plaintext, then the transforms in mode
        // order.
        let mut fragment = self.pool.pop();
        fragment.resize(explicit_iv_len, 0);

        if let Some(compression) = &mut self.compression {
            if let Err(e) = compression.compress(template.payload, &mut fragment) {
                self.pool.push(fragment);
                return Err(self.fatal(e));
            }
        } else {
            fragment.extend_from_slice(template.payload);
        }

        if !self.use_etm {
            if let Some(mac) = &mut self.mac {
                let digest = mac.compute(&meta, &fragment[explicit_iv_len..]);
                fragment.extend_from_slice(&digest);
            }
        }

        if let Some(cipher) = &mut self.cipher {
            if let Err(e) = cipher.encrypt(&meta, explicit_iv_len, &mut fragment) {
                self.pool.push(fragment);
                return Err(self.fatal(e));
            }
        }

        if self.use_etm {
            if let Some(mac) = &mut self.mac {
                let digest = mac.compute(&meta, &fragment);
                fragment.extend_from_slice(&digest);
            }
        }

        let header = RecordHeader {
            content_type: template.content_type,
            version: template.version,
            sequence: meta.sequence,
            length: fragment.len() as u16,
        };

        let mut wire = self.pool.pop();
        header.serialize(&mut wire);
        wire.extend_from_slice(&fragment);
        self.pool.push(fragment);

        if let Some(callback) = &mut self.msg_callback {
            callback(true, &wire[..RecordHeader::LEN]);
        }

        sequence_update(&mut self.write_sequence);

        // Remember the attempted write so a bad retry can be detected.
        let mut payload_copy = self.pool.pop();
        payload_copy.extend_from_slice(template.payload);
        self.wpend = Some(PendingWrite {
            content_type: template.content_type,
            payload: payload_copy,
            wire,
            total: template.payload.len(),
        });

        self.flush_pending()
    }

    fn flush_pending(&mut self) -> Result<Flush, Error> {
        let outcome = match &self.wpend {
            Some(pending) => self.transport.send(&pending.wire),
            None => return Ok(Flush::Retry),
        };

        match outcome {
            Ok(WriteOutcome::Sent) => {
                // Unwrap is ok, checked above.
                let pending = self.wpend.take().unwrap();
                let total = pending.total;
                self.pool.push(pending.wire);
                self.pool.push(pending.payload);
                Ok(Flush::Written(total))
            }
            Ok(WriteOutcome::WouldBlock) => Ok(Flush::Retry),
            Err(e) => {
                // Datagrams are all-or-nothing: a failed send drops the
                // record rather than leaving half of it pending.
                if let Some(pending) = self.wpend.take() {
                    self.pool.push(pending.wire);
                    self.pool.push(pending.payload);
                }
                Err(self.fatal(e))
            }
        }
    }

    /// The sequence the next written record will carry.
    fn next_write_sequence(&self) -> Sequence {
        let mut bytes = [0u8; 8];
        bytes[2..].copy_from_slice(&self.write_sequence[2..]);
        Sequence {
            epoch: self.epoch,
            sequence_number: u64::from_be_bytes(bytes),
        }
    }

    // ------------------------------------------------------------------
    // Control surface
    // ------------------------------------------------------------------

    /// Whether a handshake is in progress. While true, next-epoch
    /// handshake and alert records are buffered instead of dropped.
    pub fn set_in_init(&mut self, in_init: bool) {
        self.in_init = in_init;
    }

    /// Install the negotiated protocol version.
    pub fn set_protocol_version(&mut self, version: ProtocolVersion) {
        self.version = version;
    }

    /// Install the negotiated maximum fragment length.
    pub fn set_max_frag_len(&mut self, max_frag_len: usize) {
        self.max_frag_len = max_frag_len;
    }

    /// The compression method in use, if any.
    pub fn compression(&self) -> Option<&dyn Compression> {
        self.compression.as_deref()
    }

    /// The alert recorded by the most recent fatal error, if any.
    pub fn alert_code(&self) -> Option<Alert> {
        self.alert
    }

    /// This layer's epoch.
    pub fn epoch(&self) -> u16 {
        self.epoch
    }

    /// The endpoint role this layer serves.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The primary direction this layer serves.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Number of next-epoch records currently buffered.
    pub fn deferred_records(&self) -> usize {
        self.unprocessed.len()
    }

    /// Tear the layer down, migrating unread bytes and buffered
    /// next-epoch records verbatim into the `next` transport sink so the
    /// successor layer can retry them with the right keys.
    pub fn close(mut self) -> Result<(), Error> {
        self.migrate()
    }

    /// Idempotent: leftovers and queues are drained at most once.
    fn migrate(&mut self) -> Result<(), Error> {
        if self.roff < self.rbuf.len() {
            if let Some(next) = &mut self.next {
                // This layer is going away with bytes still unread. They
                // must be destined for the next epoch, so push them there.
                next.send(&self.rbuf[self.roff..])?;
            }
            self.rbuf.clear();
            self.roff = 0;
        }

        while let Some((_, record)) = self.unprocessed.pop_min() {
            if let Some(next) = &mut self.next {
                next.send(&record.packet)?;
            }
        }

        // Decrypted-but-undelivered records die with the layer.
        while self.processed.pop_min().is_some() {}

        Ok(())
    }

    /// Record the alert for a fatal condition and hand the error back.
    /// Every fatal path funnels through here.
    fn fatal(&mut self, error: Error) -> Error {
        let alert = error.alert();
        debug!("fatal record layer error {:?} (alert {})", error, alert.as_u8());
        self.alert = Some(alert);
        error
    }
}

impl Drop for RecordLayer {
    fn drop(&mut self) {
        let _ = self.migrate();
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    use subtle::ConstantTimeEq;

    a.len() == b.len() && bool::from(a.ct_eq(b))
}

/// Builder for a [`RecordLayer`].
///
/// Collects the dependency-injected collaborators: crypto state, version,
/// role, direction, epoch, transports and observers. Everything has a
/// cleartext-epoch-zero default.
pub struct RecordLayerBuilder {
    transport: Box<dyn Transport>,
    version: ProtocolVersion,
    role: Role,
    direction: Direction,
    epoch: u16,
    cipher: Option<Box<dyn RecordCipher>>,
    mac: Option<Box<dyn RecordMac>>,
    use_etm: bool,
    compression: Option<Box<dyn Compression>>,
    prev: Option<Box<dyn Transport>>,
    next: Option<Box<dyn Transport>>,
    max_frag_len: usize,
    first_record: Option<bool>,
    msg_callback: Option<MsgCallback>,
}

impl RecordLayerBuilder {
    /// Protocol version. Defaults to DTLS 1.2; use
    /// [`ProtocolVersion::Any`] before negotiation completes.
    pub fn version(mut self, version: ProtocolVersion) -> Self {
        self.version = version;
        self
    }

    /// Endpoint role. Defaults to server.
    pub fn role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Primary direction. Defaults to read.
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// The epoch this layer serves. Defaults to 0 (cleartext).
    pub fn epoch(mut self, epoch: u16) -> Self {
        self.epoch = epoch;
        self
    }

    /// Install the record cipher for this epoch's keys.
    pub fn cipher(mut self, cipher: Box<dyn RecordCipher>) -> Self {
        self.cipher = Some(cipher);
        self
    }

    /// Install the record MAC for this epoch's keys.
    pub fn mac(mut self, mac: Box<dyn RecordMac>) -> Self {
        self.mac = Some(mac);
        self
    }

    /// Apply encrypt-then-MAC ordering (RFC 7366). Defaults to
    /// MAC-then-encrypt.
    pub fn encrypt_then_mac(mut self, use_etm: bool) -> Self {
        self.use_etm = use_etm;
        self
    }

    /// Install a compression method.
    pub fn compression(mut self, compression: Box<dyn Compression>) -> Self {
        self.compression = Some(compression);
        self
    }

    /// Datagram source holding the predecessor layer's leftovers; drained
    /// before the wire.
    pub fn previous(mut self, prev: Box<dyn Transport>) -> Self {
        self.prev = Some(prev);
        self
    }

    /// Datagram sink receiving this layer's leftovers at teardown.
    pub fn next(mut self, next: Box<dyn Transport>) -> Self {
        self.next = Some(next);
        self
    }

    /// Negotiated maximum fragment length. Defaults to
    /// [`MAX_PLAIN_LENGTH`].
    pub fn max_frag_len(mut self, max_frag_len: usize) -> Self {
        self.max_frag_len = max_frag_len;
        self
    }

    /// Whether the next record is the first on the connection, which
    /// relaxes the version check. Defaults to true for epoch 0.
    pub fn first_record(mut self, first_record: bool) -> Self {
        self.first_record = Some(first_record);
        self
    }

    /// Observer for record headers as they are read and written.
    pub fn msg_callback(mut self, callback: MsgCallback) -> Self {
        self.msg_callback = Some(callback);
        self
    }

    /// Build the layer.
    pub fn build(self) -> RecordLayer {
        let epoch = self.epoch;

        RecordLayer {
            version: self.version,
            role: self.role,
            direction: self.direction,
            epoch,
            in_init: true,
            is_first_record: self.first_record.unwrap_or(epoch == 0),
            max_frag_len: self.max_frag_len,
            cipher: self.cipher,
            mac: self.mac,
            compression: self.compression,
            use_etm: self.use_etm,
            transport: self.transport,
            prev: self.prev,
            next: self.next,
            msg_callback: self.msg_callback,
            pool: BufferPool::default(),
            rbuf: Buf::new(),
            roff: 0,
            packet: Buf::new(),
            rstate: ReadState::Header,
            replay: ReplayWindow::new(),
            next_replay: ReplayWindow::new(),
            unprocessed: DeferredQueue::new(epoch.wrapping_add(1)),
            processed: DeferredQueue::new(epoch),
            current: None,
            write_sequence: [0; 8],
            wpend: None,
            alert: None,
        }
    }
}
