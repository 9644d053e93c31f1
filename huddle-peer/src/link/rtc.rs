use crate::config::PeerConfig;
use crate::link::{
    AudioTrack, GatherSignal, LinkEvent, LinkFactory, NewLink, PeerLink, Role, SessionId,
};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use huddle_core::IceServerConfig;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MediaEngine};
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::data_channel::data_channel_state::RTCDataChannelState;
use webrtc::ice_transport::ice_candidate::RTCIceCandidate;
use webrtc::ice_transport::ice_gatherer_state::RTCIceGathererState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Builds webrtc-backed links.
#[derive(Clone)]
pub struct RtcLinkFactory {
    ice_servers: Vec<IceServerConfig>,
}

impl RtcLinkFactory {
    pub fn new(config: &PeerConfig) -> Self {
        Self {
            ice_servers: config.ice_servers.clone(),
        }
    }
}

#[async_trait]
impl LinkFactory for RtcLinkFactory {
    async fn connect(
        &self,
        id: SessionId,
        role: Role,
        events: mpsc::UnboundedSender<LinkEvent>,
    ) -> Result<NewLink> {
        let (link, gathering) = RtcLink::new(id, role, &self.ice_servers, events).await?;
        Ok(NewLink {
            link: Arc::new(link),
            gathering,
        })
    }
}

pub struct RtcLink {
    id: SessionId,
    peer_connection: Arc<RTCPeerConnection>,
    channel: Arc<Mutex<Option<Arc<RTCDataChannel>>>>,
    /// Sender of the audio transceiver both sides negotiate up front.
    audio: Arc<RTCRtpSender>,
    /// Bound while the mic is off, so the sender always has a track to
    /// replace.
    silence: AudioTrack,
    events: mpsc::UnboundedSender<LinkEvent>,
}

fn silent_track() -> AudioTrack {
    Arc::new(TrackLocalStaticSample::new(
        RTCRtpCodecCapability {
            mime_type: MIME_TYPE_OPUS.to_owned(),
            ..Default::default()
        },
        "audio".to_owned(),
        "huddle".to_owned(),
    ))
}

impl RtcLink {
    pub async fn new(
        id: SessionId,
        role: Role,
        ice_servers: &[IceServerConfig],
        events: mpsc::UnboundedSender<LinkEvent>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<GatherSignal>)> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);
        // Added before any description exists: the offerer's m=audio comes
        // from it, and the answerer's copy is matched to the remote section.
        let silence = silent_track();
        let transceiver = peer_connection
            .add_transceiver_from_track(
                silence.clone(),
                Some(RTCRtpTransceiverInit {
                    direction: RTCRtpTransceiverDirection::Sendrecv,
                    send_encodings: vec![],
                }),
            )
            .await
            .context("Failed to add audio transceiver")?;
        let audio = transceiver.sender().await;

        let channel: Arc<Mutex<Option<Arc<RTCDataChannel>>>> = Arc::new(Mutex::new(None));
        let (gather_tx, gather_rx) = mpsc::unbounded_channel();

        let state_tx = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |state: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                Box::pin(async move {
                    info!("Peer connection {} is {:?}", id, state);
                    if matches!(
                        state,
                        RTCPeerConnectionState::Failed | RTCPeerConnectionState::Closed
                    ) {
                        let _ = tx.send(LinkEvent::Closed(id));
                    }
                })
            },
        ));

        let candidate_tx = gather_tx.clone();
        peer_connection.on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
            let tx = candidate_tx.clone();
            Box::pin(async move {
                let signal = match candidate {
                    Some(_) => GatherSignal::Candidate,
                    None => GatherSignal::Complete,
                };
                let _ = tx.send(signal);
            })
        }));

        peer_connection.on_ice_gathering_state_change(Box::new(
            move |state: RTCIceGathererState| {
                let tx = gather_tx.clone();
                Box::pin(async move {
                    if state == RTCIceGathererState::Complete {
                        let _ = tx.send(GatherSignal::Complete);
                    }
                })
            },
        ));

        // The answering side receives the channel the offerer opened.
        if role == Role::Host {
            let slot = channel.clone();
            let dc_tx = events.clone();
            peer_connection.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
                let slot = slot.clone();
                let tx = dc_tx.clone();
                Box::pin(async move {
                    debug!("Data channel '{}' arrived for {}", dc.label(), id);
                    wire_channel(id, &dc, tx);
                    *slot.lock() = Some(dc);
                })
            }));
        }

        let link = Self {
            id,
            peer_connection,
            channel,
            audio,
            silence,
            events,
        };
        Ok((link, gather_rx))
    }

    fn data_channel(&self) -> Option<Arc<RTCDataChannel>> {
        self.channel.lock().clone()
    }
}

fn wire_channel(id: SessionId, dc: &Arc<RTCDataChannel>, events: mpsc::UnboundedSender<LinkEvent>) {
    let open_tx = events.clone();
    dc.on_open(Box::new(move || {
        Box::pin(async move {
            info!("Data channel open for {}", id);
            let _ = open_tx.send(LinkEvent::Open(id));
        })
    }));

    let message_tx = events.clone();
    dc.on_message(Box::new(move |msg: DataChannelMessage| {
        let tx = message_tx.clone();
        Box::pin(async move {
            if !msg.is_string {
                debug!("Ignoring binary frame from {}", id);
                return;
            }
            let text = String::from_utf8_lossy(&msg.data).into_owned();
            let _ = tx.send(LinkEvent::Message(id, text));
        })
    }));

    dc.on_close(Box::new(move || {
        let tx = events.clone();
        Box::pin(async move {
            info!("Data channel closed for {}", id);
            let _ = tx.send(LinkEvent::Closed(id));
        })
    }));
}

#[async_trait]
impl PeerLink for RtcLink {
    async fn create_offer(&self, label: &str) -> Result<()> {
        let dc = self
            .peer_connection
            .create_data_channel(label, None)
            .await
            .context("Failed to create data channel")?;
        wire_channel(self.id, &dc, self.events.clone());
        *self.channel.lock() = Some(dc);

        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .context("Failed to create offer")?;
        self.peer_connection
            .set_local_description(offer)
            .await
            .context("Failed to set local description")?;
        Ok(())
    }

    async fn accept_offer(&self, offer: &str) -> Result<()> {
        let offer: RTCSessionDescription =
            serde_json::from_str(offer).context("Offer is not a session description")?;
        self.peer_connection
            .set_remote_description(offer)
            .await
            .context("Failed to apply remote offer")?;

        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .context("Failed to create answer")?;
        self.peer_connection
            .set_local_description(answer)
            .await
            .context("Failed to set local description")?;
        Ok(())
    }

    async fn apply_answer(&self, answer: &str) -> Result<()> {
        let state = self.peer_connection.signaling_state();
        if state != RTCSignalingState::HaveLocalOffer {
            bail!("no local offer awaiting an answer (signaling state {})", state);
        }

        let answer: RTCSessionDescription =
            serde_json::from_str(answer).context("Answer is not a session description")?;
        self.peer_connection
            .set_remote_description(answer)
            .await
            .context("Failed to apply remote answer")?;
        Ok(())
    }

    async fn local_description(&self) -> Result<String> {
        let description = self
            .peer_connection
            .local_description()
            .await
            .context("No local description yet")?;
        Ok(serde_json::to_string(&description)?)
    }

    fn is_open(&self) -> bool {
        self.data_channel()
            .is_some_and(|dc| dc.ready_state() == RTCDataChannelState::Open)
    }

    async fn send(&self, text: &str) -> Result<()> {
        let dc = self.data_channel().context("Data channel not available")?;
        dc.send_text(text.to_owned())
            .await
            .context("Failed to send message")?;
        Ok(())
    }

    async fn set_audio_track(&self, track: Option<AudioTrack>) -> Result<()> {
        // Muting binds silence instead of clearing the sender, which would
        // drop its encoding and make later swaps fail.
        let track = track.unwrap_or_else(|| self.silence.clone());
        self.audio
            .replace_track(Some(track))
            .await
            .context("Failed to swap audio track")?;
        debug!("Audio track swapped on {}", self.id);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}
